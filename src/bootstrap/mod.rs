//! Workspace initialization and bundled Claude assets.
//!
//! `orchestra-mcp init` scaffolds the workspace: a `.mcp.json` server
//! registration (merged into any existing file), the `.projects/` tree,
//! and the bundled skills, agents, and doc files. The same bundled
//! assets back the `install_skills` / `install_agents` / `install_docs`
//! tools.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::Result;

/// Bundled skills, compiled into the binary: (name, SKILL.md content).
const SKILLS: &[(&str, &str)] = &[
    (
        "project-planner",
        include_str!("assets/skills/project-planner/SKILL.md"),
    ),
    ("bug-triage", include_str!("assets/skills/bug-triage/SKILL.md")),
];

/// Bundled agents: (name, markdown content).
const AGENTS: &[(&str, &str)] = &[
    ("qa-rust", include_str!("assets/agents/qa-rust.md")),
    ("doc-writer", include_str!("assets/agents/doc-writer.md")),
];

/// Bundled workspace docs: (filename, content).
const DOCS: &[(&str, &str)] = &[
    ("CLAUDE.md", include_str!("assets/docs/CLAUDE.md")),
    ("AGENTS.md", include_str!("assets/docs/AGENTS.md")),
    ("CONTEXT.md", include_str!("assets/docs/CONTEXT.md")),
];

/// Names of the bundled skills.
pub fn list_bundled_skills() -> Vec<&'static str> {
    SKILLS.iter().map(|(name, _)| *name).collect()
}

/// Names of the bundled agents.
pub fn list_bundled_agents() -> Vec<&'static str> {
    AGENTS.iter().map(|(name, _)| *name).collect()
}

/// Write every bundled skill under `target/<name>/SKILL.md`. Returns the
/// number of files written.
pub fn install_skills(target: &Path) -> Result<usize> {
    let mut count = 0;
    for (name, content) in SKILLS {
        let dir = target.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("SKILL.md"), content)?;
        count += 1;
    }
    Ok(count)
}

/// Write every bundled agent under `target/<name>.md`.
pub fn install_agents(target: &Path) -> Result<usize> {
    fs::create_dir_all(target)?;
    let mut count = 0;
    for (name, content) in AGENTS {
        fs::write(target.join(format!("{}.md", name)), content)?;
        count += 1;
    }
    Ok(count)
}

/// Install CLAUDE.md, AGENTS.md, CONTEXT.md into the workspace root.
/// Existing files are left alone so user customizations survive.
pub fn install_docs(root: &Path) -> usize {
    let mut count = 0;
    for (name, content) in DOCS {
        let dest = root.join(name);
        if dest.exists() {
            continue;
        }
        if fs::write(&dest, content).is_ok() {
            count += 1;
        }
    }
    count
}

/// Merge this server into the workspace `.mcp.json` registration file.
fn write_mcp_json(root: &Path) -> Result<()> {
    let path = root.join(".mcp.json");
    let mut config: Map<String, Value> = fs::read_to_string(&path)
        .ok()
        .and_then(|data| serde_json::from_str(&data).ok())
        .unwrap_or_default();
    let servers = config
        .entry("mcpServers".to_string())
        .or_insert_with(|| json!({}));
    if let Some(servers) = servers.as_object_mut() {
        servers.insert(
            "orchestra-mcp".to_string(),
            json!({
                "command": "orchestra-mcp",
                "args": ["--workspace", root.display().to_string()],
            }),
        );
    }
    let data = serde_json::to_string_pretty(&config)?;
    fs::write(&path, format!("{}\n", data))?;
    Ok(())
}

/// Initialize Orchestra MCP in the given workspace.
pub fn run(workspace: &Path) -> Result<()> {
    let root = workspace
        .canonicalize()
        .unwrap_or_else(|_| workspace.to_path_buf());
    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .map(crate::ids::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "workspace".to_string());

    write_mcp_json(&root)?;
    fs::create_dir_all(root.join(".projects").join(&project_name))?;
    fs::create_dir_all(root.join(".projects").join(".events"))?;

    let claude_dir = root.join(".claude");
    let skill_count = install_skills(&claude_dir.join("skills"))?;
    let agent_count = install_agents(&claude_dir.join("agents"))?;
    let doc_count = install_docs(&root);

    println!("Orchestra MCP initialized!");
    println!("  Project:  {}", project_name);
    println!("  Root:     {}", root.display());
    println!("  Config:   .mcp.json");
    println!("  Data:     .projects/{}/", project_name);
    println!("  Skills:   .claude/skills/ ({} installed)", skill_count);
    println!("  Agents:   .claude/agents/ ({} installed)", agent_count);
    println!("  Docs:     CLAUDE.md, AGENTS.md, CONTEXT.md ({} installed)", doc_count);
    Ok(())
}
