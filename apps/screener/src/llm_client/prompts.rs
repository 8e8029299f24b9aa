// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// Persona preamble used by every scoring prompt.
pub const RECRUITER_PERSONA: &str = "You are an experienced HR and recruiting specialist. \
    You evaluate candidates strictly on the evidence in their CV.";

/// Instruction appended to prompts whose reply is constrained by a response schema.
pub const SCHEMA_ONLY_INSTRUCTION: &str = "Return the evaluation as a single JSON object \
    that follows the declared response schema exactly. \
    Use integers for every score, stay inside the documented ranges, \
    and do NOT add fields that are not declared.";
