//! Prompt Templates
//!
//! Fixed instructional templates sent as the system message of every call.
//! Each template opens with a distinct role line.

/// Marker a detector emits when a batch holds no conflicts
pub const NO_CONFLICTS_MARKER: &str = "NO_CONFLICTS_FOUND";

/// Marker a detector emits when a batch implies no challenges
pub const NO_CHALLENGES_MARKER: &str = "NO_CHALLENGES_FOUND";

/// How hard the detection prompt pushes back on speculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionStrictness {
    #[default]
    Standard,
    /// Used after a pass scored below the relevance floor
    Strict,
}

const ANALYSIS_OUTPUT_FORMAT: &str = "Respond with exactly one JSON block:\n\
```json\n\
{\n\
  \"confidence\": 0-100,\n\
  \"clarifications_needed\": [\"question\", ...],\n\
  \"assumptions\": [\"assumption\", ...],\n\
  \"gaps\": [\"missing information\", ...]\n\
}\n\
```\n\
Order clarifications_needed from most to least important. \
Only list assumptions you would actually have to make to proceed. \
Do not invent requirements that are not in the request.";

pub fn requirements_analysis_prompt() -> String {
    format!(
        "You are a requirements analyst assessing how complete a product request is.\n\n\
         Judge whether a team could start building from this request without material \
         correction. Consider purpose, target users, core features, constraints, and success \
         criteria.\n\n\
         {ANALYSIS_OUTPUT_FORMAT}"
    )
}

pub fn technical_stack_prompt() -> String {
    format!(
        "You are a software architect assessing how completely a product request specifies \
         its technical stack.\n\n\
         Consider platforms, languages, frameworks, data storage, hosting, and integrations. \
         A request that names none of these has low confidence; one that names them all has \
         high confidence.\n\n\
         {ANALYSIS_OUTPUT_FORMAT}"
    )
}

pub fn reanalysis_prompt() -> String {
    format!(
        "You are a requirements analyst re-assessing a product request that has been enriched \
         with clarifications.\n\n\
         The request is followed by the questions that were asked and the answers given. \
         Treat answered questions as resolved.\n\n\
         {ANALYSIS_OUTPUT_FORMAT}"
    )
}

pub fn conflict_detection_prompt(strictness: DetectionStrictness) -> String {
    let strict_preamble = match strictness {
        DetectionStrictness::Standard => "",
        DetectionStrictness::Strict => {
            "STRICT MODE. A previous review reported conflicts that could not be traced to the \
             statements. Report a conflict only when two statements, read literally, cannot both \
             be satisfied. Generic concerns are never conflicts.\n\n"
        }
    };
    format!(
        "{strict_preamble}You review numbered requirement statements for architectural conflicts.\n\n\
         Most requirement sets contain no conflicts. If you find none, reply with exactly \
         {NO_CONFLICTS_MARKER} and nothing else.\n\n\
         Rules:\n\
         - A conflict is two statements from the list that cannot both be fully satisfied.\n\
         - requirement1 and requirement2 MUST be verbatim quotes copied from the statements.\n\
         - Never use placeholders such as \"Requirement A\" or \"Feature X\".\n\
         - Do not report general risks such as scalability or technical debt unless a \
           statement names them.\n\n\
         Otherwise respond with exactly one JSON block:\n\
         ```json\n\
         {{\n\
           \"conflicts\": [\n\
             {{\n\
               \"requirement1\": \"verbatim quote\",\n\
               \"requirement2\": \"verbatim quote\",\n\
               \"conflictType\": \"performanceVsFeature|securityVsUsability|scaleVsSimplicity|realtimeVsOffline|privacyVsFunctionality|mutuallyExclusive\",\n\
               \"severity\": \"low|medium|high|critical\",\n\
               \"resolution\": {{\"approach\": \"...\", \"tradeoffs\": [\"...\"], \"recommendation\": \"...\"}},\n\
               \"realWorldExamples\": [\"...\"]\n\
             }}\n\
           ]\n\
         }}\n\
         ```"
    )
}

pub fn challenge_detection_prompt(strictness: DetectionStrictness) -> String {
    let strict_preamble = match strictness {
        DetectionStrictness::Standard => "",
        DetectionStrictness::Strict => {
            "STRICT MODE. A previous review reported challenges that could not be traced to the \
             statements. Report a challenge only when a statement explicitly demands the \
             capability that makes it hard.\n\n"
        }
    };
    format!(
        "{strict_preamble}You review numbered requirement statements for technical challenges.\n\n\
         A technical challenge is an implementation difficulty implied by an explicitly stated \
         requirement, not a generic project risk. If none of the statements implies one, reply \
         with exactly {NO_CHALLENGES_MARKER} and nothing else.\n\n\
         relatedRequirement MUST be a verbatim quote of the statement that causes the challenge.\n\n\
         Otherwise respond with exactly one JSON block:\n\
         ```json\n\
         {{\n\
           \"challenges\": [\n\
             {{\n\
               \"title\": \"...\",\n\
               \"description\": \"...\",\n\
               \"category\": \"...\",\n\
               \"priority\": \"low|medium|high|critical\",\n\
               \"impact\": {{\"severity\": \"low|medium|high|critical\", \"description\": \"...\"}},\n\
               \"detectionPoint\": \"...\",\n\
               \"preventiveMeasures\": [\"...\"],\n\
               \"relatedRequirement\": \"verbatim quote\"\n\
             }}\n\
           ]\n\
         }}\n\
         ```"
    )
}

/// Number the statements of one batch for the user message
pub fn numbered_statements(statements: &[String]) -> String {
    statements
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}
