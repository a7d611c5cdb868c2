//! Prompt builders.
//!
//! Wording here is free to change; the loop only depends on the model
//! answering in the `Thought:` / `Action:` / `Final Answer:` format and,
//! for change sets, in the block grammar from `frontsmith_protocol`.

use frontsmith_core::project::ProjectSnapshot;
use frontsmith_protocol::change_block::{render_block, DELETE_DIRECTIVE};

/// System turn inserted once per session.
pub fn system(snapshot: &ProjectSnapshot) -> String {
    format!(
        "You are a senior front-end engineer and UX designer working on an existing project.\n\
         You reason step by step before acting, using this format:\n\
         Thought: your reasoning and plan\n\
         Action: one action from the list below\n\
         Observation: the result of the action (provided to you)\n\
         Final Answer: the answer to the original request\n\n\
         Available actions:\n\
         1. analyze_project() - re-analyze the project structure\n\
         2. read_file(\"file_path\") - read a project file\n\
         3. write_file(\"file_path\", \"content\") - write a project file\n\
         4. perform_analysis_task(\"requirement\") - answer a question that needs no file changes\n\
         5. perform_file_operations(\"requirement\") - carry out a change to project files\n\n\
         Use perform_analysis_task for requests like 'Explain the project structure'.\n\
         Use perform_file_operations for requests like 'Add a settings page'.\n\
         Always end with a Final Answer that addresses the request.\n\
         Code you write must be complete and follow the project's existing style.\n\n\
         Current project structure:\n{}",
        snapshot.to_pretty_json()
    )
}

/// Ask the model to route a requirement to one of the two task actions.
pub fn decision(requirement: &str, snapshot: &ProjectSnapshot) -> String {
    format!(
        "User requirement: {requirement}\n\n\
         Project structure:\n{}\n\n\
         Decide which kind of task this is and take the matching action:\n\
         - perform_file_operations(\"{requirement}\") when project files must change\n\
         - perform_analysis_task(\"{requirement}\") when only information or explanation is needed\n\n\
         File operation examples: 'Add a login page', 'Change the color scheme', 'Delete unused components'.\n\
         Analysis examples: 'Explain what this page does', 'How does this component work'.",
        snapshot.to_pretty_json()
    )
}

pub fn analysis(requirement: &str, snapshot: &ProjectSnapshot) -> String {
    format!(
        "Provide a detailed analysis or explanation for the user requirement below. \
         This task must not change any files.\n\
         User requirement: {requirement}\n\n\
         Project structure:\n{}\n\n\
         Cover what is relevant: structure overview, how the project meets the requirement, \
         suggested improvements, risks. Answer in a clear, structured format.",
        snapshot.to_pretty_json()
    )
}

pub fn file_list(requirement: &str, snapshot: &ProjectSnapshot) -> String {
    format!(
        "List the files that must be modified, created or deleted for this requirement.\n\
         User requirement: {requirement}\n\
         Project structure:\n{}\n\n\
         Use read_file(\"path\") or analyze_project() as needed before deciding.\n\
         Final Answer: only the file paths relative to the project root, one per line \
         (for example src/App.jsx), nothing else. Leave out files you are unsure about.",
        snapshot.to_pretty_json()
    )
}

/// The change-set request. `files` is the rendered block blob of current contents.
pub fn modification(requirement: &str, files: &str) -> String {
    let example = render_block("src/App.jsx", "<complete new file content>");
    format!(
        "These project files need to change for the requirement \"{requirement}\". \
         Current contents (or a placeholder for new files):\n{files}\n\n\
         Give the complete new content of every file.\n\
         Final Answer: one block per file, exactly in this format:\n{example}\n\
         To delete a file put only `{DELETE_DIRECTIVE}` between the code markers.\n\
         Output nothing outside the blocks. Keep existing logic unless the requirement \
         says otherwise, follow the project's design language, and avoid new \
         third-party libraries unless asked."
    )
}

pub fn failure_analysis(message: &str, snapshot: &ProjectSnapshot) -> String {
    format!(
        "The project cannot be run. Error message: {message}\n\
         Project structure:\n{}\n\n\
         Determine why. If the cause is missing dependencies, answer exactly 'dependency issue'; \
         otherwise explain the cause. Output only the analysis.",
        snapshot.to_pretty_json()
    )
}
