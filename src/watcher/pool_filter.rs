//! Pool event filter.
//!
//! Classifies a raw log notification as a pool creation by keyword. There is
//! no deduplication here; the same signature may come through more than once.

use crate::types::PoolCandidate;
use crate::watcher::types::{PoolDecision, RawLogEvent};

/// Lower-case substrings that mark a pool-creation instruction.
pub const CREATION_KEYWORDS: [&str; 3] = ["initialize", "create_pool", "init_pool"];

/// Returns the first log line containing a creation keyword, ignoring case.
pub fn find_creation_line(logs: &[String]) -> Option<&str> {
    logs.iter()
        .map(String::as_str)
        .find(|line| {
            let lower = line.to_lowercase();
            CREATION_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        })
}

pub fn classify(event: &RawLogEvent) -> PoolDecision {
    let Some(line) = find_creation_line(&event.logs) else {
        return PoolDecision::NotPoolEvent;
    };

    match event.signature.as_deref().filter(|s| !s.is_empty()) {
        Some(signature) => PoolDecision::Creation(PoolCandidate {
            signature: signature.to_string(),
            matched_line: line.to_string(),
            slot: event.slot,
        }),
        None => PoolDecision::MissingSignature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(signature: Option<&str>, logs: &[&str]) -> RawLogEvent {
        RawLogEvent::new(
            signature.map(str::to_string),
            logs.iter().map(|l| l.to_string()).collect(),
        )
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        for line in [
            "Program log: initialize2",
            "Program log: Instruction: InitializePool",
            "Program log: CREATE_POOL",
            "Program log: init_pool called",
        ] {
            let decision = classify(&event(Some("SIG"), &["Program invoke [1]", line]));
            match decision {
                PoolDecision::Creation(candidate) => {
                    assert_eq!(candidate.signature, "SIG");
                    assert_eq!(candidate.matched_line, line);
                }
                other => panic!("expected creation for '{}', got {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_unrelated_logs_are_not_pool_events() {
        let decision = classify(&event(
            Some("SIG"),
            &["Program log: Instruction: Swap", "Program log: ray_log: AAAA", "Program consumed 1234 units"],
        ));
        assert_eq!(decision, PoolDecision::NotPoolEvent);
        assert_eq!(classify(&event(Some("SIG"), &[])), PoolDecision::NotPoolEvent);
    }

    #[test]
    fn test_keyword_without_signature() {
        assert_eq!(
            classify(&event(None, &["Program log: initialize2"])),
            PoolDecision::MissingSignature
        );
        assert_eq!(
            classify(&event(Some(""), &["Program log: initialize2"])),
            PoolDecision::MissingSignature
        );
    }
}
