//! The closed set of actions the model may request.

use frontsmith_protocol::ParsedAction;

/// Requirement used when `perform_analysis_task` is called with no arguments.
pub const DEFAULT_ANALYSIS_REQUIREMENT: &str = "Analyze the project and provide information";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Re-scan the project and refresh the snapshot
    AnalyzeProject,
    ReadFile { path: String },
    WriteFile { path: String, content: String },
    /// Nested interaction answering a question about the project
    PerformAnalysisTask { requirement: String },
    /// Two-phase file-list then change-set pipeline
    PerformFileOperations { requirement: String },
    /// Unrecognized name, or a known name without the arguments it needs
    Unknown { name: String },
}

impl Action {
    pub fn from_parsed(parsed: &ParsedAction) -> Self {
        let args = &parsed.arguments;
        let unknown = || Action::Unknown { name: parsed.name.clone() };

        match parsed.name.as_str() {
            "analyze_project" => Action::AnalyzeProject,
            "read_file" => match args.first() {
                Some(path) if !path.trim().is_empty() => Action::ReadFile { path: path.trim().to_string() },
                _ => unknown(),
            },
            // Content containing commas arrives split; glue the pieces back together.
            "write_file" if args.len() >= 2 && !args[0].trim().is_empty() => Action::WriteFile {
                path: args[0].trim().to_string(),
                content: args[1..].join(" "),
            },
            "perform_analysis_task" => {
                let requirement = args.join(" ").trim().to_string();
                Action::PerformAnalysisTask {
                    requirement: if requirement.is_empty() {
                        DEFAULT_ANALYSIS_REQUIREMENT.to_string()
                    } else {
                        requirement
                    },
                }
            }
            "perform_file_operations" => {
                let requirement = args.join(" ").trim().to_string();
                if requirement.is_empty() {
                    unknown()
                } else {
                    Action::PerformFileOperations { requirement }
                }
            }
            _ => unknown(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::AnalyzeProject => "analyze_project",
            Action::ReadFile { .. } => "read_file",
            Action::WriteFile { .. } => "write_file",
            Action::PerformAnalysisTask { .. } => "perform_analysis_task",
            Action::PerformFileOperations { .. } => "perform_file_operations",
            Action::Unknown { name } => name,
        }
    }
}
