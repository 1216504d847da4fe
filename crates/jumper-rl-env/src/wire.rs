//! Reply format of the game server
//!
//! The server answers every action with a dictionary holding the new state
//! string and the reward, e.g. `{'estado': '0b0000100', 'recompensa': -14}`.
//! Both the Python-repr spelling (single quotes) and plain JSON are accepted,
//! as are the English key names `state` and `reward`.

use serde::Deserialize;

use jumper_rl_core::{Observation, RLError, Result};

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(alias = "estado")]
    state: String,
    #[serde(alias = "recompensa")]
    reward: f64,
}

/// Try to decode one reply from the front of `text`
///
/// Returns the observation and the number of bytes it used, or `None` when
/// `text` does not yet hold a complete reply.
pub fn parse_reply(text: &str) -> Result<Option<(Observation, usize)>> {
    // Same byte length, so offsets stay valid for `text`.
    let normalized = text.replace('\'', "\"");

    let mut replies = serde_json::Deserializer::from_str(&normalized).into_iter::<Reply>();
    match replies.next() {
        None => Ok(None),
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => Err(RLError::Environment(format!(
            "unreadable reply {text:?}: {e}"
        ))),
        Some(Ok(reply)) => Ok(Some((
            Observation::new(reply.state, reply.reward),
            replies.byte_offset(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jumper_rl_core::Reward;

    #[test]
    fn test_python_repr_reply() {
        let (obs, used) = parse_reply("{'estado': '0b0000100', 'recompensa': -14}")
            .unwrap()
            .unwrap();
        assert_eq!(obs.state.as_str(), "0b0000100");
        assert_eq!(obs.reward, Reward(-14.0));
        assert_eq!(used, 42);
    }

    #[test]
    fn test_json_reply_with_english_keys() {
        let (obs, _) = parse_reply(r#"{"state": "000000001", "reward": 1.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(obs, Observation::new("000000001", 1.5));
    }

    #[test]
    fn test_partial_reply_waits_for_more() {
        assert!(parse_reply("").unwrap().is_none());
        assert!(parse_reply("{'estado': '0b00").unwrap().is_none());
    }

    #[test]
    fn test_trailing_data_is_left_over() {
        let text = "{'estado': '0b1', 'recompensa': 0}{'estado'";
        let (obs, used) = parse_reply(text).unwrap().unwrap();
        assert_eq!(obs.state.as_str(), "0b1");
        assert_eq!(&text[used..], "{'estado'");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(parse_reply("hello"), Err(RLError::Environment(_))));
        assert!(parse_reply("{'estado': 3, 'recompensa': 0}").is_err());
    }
}
