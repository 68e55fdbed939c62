//! Static prompt text for the generative fallback.

/// Demands a strict JSON envelope: an object whose `risks` array holds one record per risk.
pub const SYSTEM_PROMPT: &str = r#"You are an expert GRC automation engine.
Map the user's audit findings to compliance controls in ISO 27001:2022 Annex A, SOC 2, HIPAA and NIST CSF.
Output STRICT JSON only. No markdown. No commentary.
Structure:
{"risks": [{"description": "...", "controlMapping": {"iso_27001": "...", "soc_2": "...", "hipaa": "...", "nist_csf": "..."}, "recommendation": "..."}]}
Omit a framework key when no control applies."#;

/// Frames the sanitized finding as the user turn.
pub fn user_prompt(finding: &str) -> String {
    format!("Map these audit findings to compliance controls:\n\n{finding}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_envelope() {
        assert!(SYSTEM_PROMPT.contains(r#"{"risks": ["#));
        assert!(SYSTEM_PROMPT.contains("controlMapping"));
        assert!(SYSTEM_PROMPT.contains("STRICT JSON"));
    }

    #[test]
    fn test_user_prompt_embeds_finding_verbatim() {
        let prompt = user_prompt("No MFA on VPN {\"x\": 1}");
        assert!(prompt.ends_with("No MFA on VPN {\"x\": 1}"));
    }
}
