//! Root window status text.
//!
//! Text starting with `#!` is a control message naming a registered signal,
//! optionally followed by a typed argument (`i`, `ui` or `f`) and its value.
//! Anything else is shown in the bar, with bytes `0x01..=0x08` switching to
//! status color scheme `byte - 1` for the text that follows.

use crate::keyboard::{Arg, KeyAction};
use serde::Deserialize;

pub const SIGNAL_MARKER: &str = "#!";
const SCHEME_SWITCH: std::ops::RangeInclusive<u8> = 0x01..=0x08;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSegment {
    pub text: String,
    pub scheme: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Text(Vec<StatusSegment>),
    Signal { name: String, arg: Arg },
    /// A control message that could not be parsed; dropped silently.
    Malformed,
}

/// Argument type a signal accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ArgKind {
    None,
    Int,
    UInt,
    Float,
    /// An unsigned tag index, handed to the action as a one-bit tag mask.
    TagIndex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalBinding {
    pub name: String,
    pub func: KeyAction,
    pub kind: ArgKind,
}

impl SignalBinding {
    pub fn new(name: &str, func: KeyAction, kind: ArgKind) -> Self {
        Self {
            name: name.to_string(),
            func,
            kind,
        }
    }
}

pub fn parse_status(raw: &str) -> StatusUpdate {
    match raw.strip_prefix(SIGNAL_MARKER) {
        Some(message) => parse_signal(message),
        None => StatusUpdate::Text(split_schemes(raw)),
    }
}

fn parse_signal(message: &str) -> StatusUpdate {
    let mut tokens = message.split_whitespace();

    let Some(name) = tokens.next() else {
        return StatusUpdate::Malformed;
    };
    let valid_name = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid_name {
        return StatusUpdate::Malformed;
    }

    let arg = match (tokens.next(), tokens.next()) {
        (None, _) => Some(Arg::None),
        (Some("i"), Some(value)) => value.parse().ok().map(Arg::Int),
        (Some("ui"), Some(value)) => value.parse().ok().map(Arg::UInt),
        (Some("f"), Some(value)) => value.parse().ok().map(Arg::Float),
        _ => None,
    };

    match (arg, tokens.next()) {
        (Some(arg), None) => StatusUpdate::Signal {
            name: name.to_string(),
            arg,
        },
        _ => StatusUpdate::Malformed,
    }
}

fn split_schemes(raw: &str) -> Vec<StatusSegment> {
    let mut segments = Vec::new();
    let mut scheme = 0;
    let mut current = String::new();

    for ch in raw.chars() {
        let byte = u8::try_from(u32::from(ch)).ok();
        match byte {
            Some(byte) if SCHEME_SWITCH.contains(&byte) => {
                if !current.is_empty() {
                    segments.push(StatusSegment {
                        text: std::mem::take(&mut current),
                        scheme,
                    });
                }
                scheme = usize::from(byte - 1);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(StatusSegment {
            text: current,
            scheme,
        });
    }
    segments
}

/// Looks a signal up and checks its argument against what it accepts. Tag
/// indexes must name one of the `tag_count` configured tags.
pub fn resolve_signal(
    name: &str,
    arg: Arg,
    bindings: &[SignalBinding],
    tag_count: usize,
) -> Option<(KeyAction, Arg)> {
    let binding = bindings.iter().find(|binding| binding.name == name)?;
    let tag_count = tag_count.min(crate::MAX_TAGS);

    let arg = match (binding.kind, arg) {
        (ArgKind::None, Arg::None) => Arg::None,
        (ArgKind::Int, Arg::Int(value)) => Arg::Int(value),
        (ArgKind::UInt, Arg::UInt(value)) => Arg::UInt(value),
        (ArgKind::Float, Arg::Float(value)) => Arg::Float(value),
        (ArgKind::TagIndex, Arg::UInt(index)) if (index as usize) < tag_count => Arg::UInt(1 << index),
        _ => return None,
    };

    Some((binding.func, arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(
            parse_status("tagwm"),
            StatusUpdate::Text(vec![StatusSegment {
                text: "tagwm".into(),
                scheme: 0
            }])
        );
    }

    #[test]
    fn control_bytes_switch_schemes() {
        let update = parse_status("cpu\u{3}hot\u{1}ok");

        assert_eq!(
            update,
            StatusUpdate::Text(vec![
                StatusSegment {
                    text: "cpu".into(),
                    scheme: 0
                },
                StatusSegment {
                    text: "hot".into(),
                    scheme: 2
                },
                StatusSegment {
                    text: "ok".into(),
                    scheme: 0
                },
            ])
        );
    }

    #[test]
    fn empty_status_has_no_segments() {
        assert_eq!(parse_status(""), StatusUpdate::Text(Vec::new()));
    }

    #[test_case("#!quit", Arg::None; "no argument")]
    #[test_case("#!view ui 4", Arg::UInt(4); "unsigned")]
    #[test_case("#!focusstack i -1", Arg::Int(-1); "signed")]
    #[test_case("#!setmfact f 0.05", Arg::Float(0.05); "float")]
    #[test]
    fn signals_are_parsed(raw: &str, expected: Arg) {
        match parse_status(raw) {
            StatusUpdate::Signal { arg, .. } => assert_eq!(arg, expected),
            other => panic!("expected a signal, got {:?}", other),
        }
    }

    #[test_case("#!"; "missing name")]
    #[test_case("#!view ui"; "missing value")]
    #[test_case("#!view ui four"; "unparseable value")]
    #[test_case("#!view x 4"; "unknown type")]
    #[test_case("#!view ui 4 5"; "too many tokens")]
    #[test_case("#!vi-ew"; "bad name")]
    #[test]
    fn malformed_signals_are_rejected(raw: &str) {
        assert_eq!(parse_status(raw), StatusUpdate::Malformed);
    }

    #[test]
    fn signal_argument_type_must_match() {
        let bindings = vec![SignalBinding::new("view", KeyAction::View, ArgKind::UInt)];

        assert_eq!(
            resolve_signal("view", Arg::UInt(2), &bindings, 9),
            Some((KeyAction::View, Arg::UInt(2)))
        );
        assert_eq!(resolve_signal("view", Arg::Float(2.0), &bindings, 9), None);
        assert_eq!(resolve_signal("view", Arg::None, &bindings, 9), None);
        assert_eq!(resolve_signal("nope", Arg::None, &bindings, 9), None);
    }

    #[test]
    fn tag_index_signals_become_masks() {
        let bindings = vec![SignalBinding::new("viewex", KeyAction::View, ArgKind::TagIndex)];

        assert_eq!(
            resolve_signal("viewex", Arg::UInt(4), &bindings, 9),
            Some((KeyAction::View, Arg::UInt(1 << 4)))
        );
        assert_eq!(
            resolve_signal("viewex", Arg::UInt(8), &bindings, 9),
            Some((KeyAction::View, Arg::UInt(1 << 8)))
        );
        assert_eq!(resolve_signal("viewex", Arg::UInt(9), &bindings, 9), None);
        assert_eq!(resolve_signal("viewex", Arg::UInt(12), &bindings, 9), None);
        assert_eq!(resolve_signal("viewex", Arg::UInt(40), &bindings, 9), None);
    }
}
