//! Synthesis adapter (§1: "out of scope", treated as a black box).
//!
//! HDL -> BTOR2 synthesis is an external process. This module only
//! knows how to recognize an already-BTOR2 file and, failing that,
//! shell out to a caller-supplied command template.

use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// A command template containing the literal substring `{input}` and
/// `{output}`, replaced with the source file and a temporary BTOR2
/// output path before being run through a shell.
#[derive(Clone, Debug)]
pub struct SynthCommand {
    template: String,
}

impl SynthCommand {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Runs the synthesis command, writing BTOR2 to `output`. `{input}`,
    /// `{top}` and `{output}` are substituted in the template.
    pub fn run(&self, input: &Path, top_module: &str, output: &Path) -> Result<()> {
        let command = self
            .template
            .replace("{input}", &input.to_string_lossy())
            .replace("{top}", top_module)
            .replace("{output}", &output.to_string_lossy());

        let status = Command::new("sh").arg("-c").arg(&command).status()?;

        if !status.success() {
            return Err(format!(
                "synthesis command '{}' exited with {}",
                command, status
            )
            .into());
        }
        Ok(())
    }
}

/// A design file is treated as already-BTOR2 when its extension is
/// `.btor2` or `.btor`; anything else requires a `SynthCommand`.
pub fn is_btor2(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("btor2") | Some("btor")
    )
}

/// Produces the BTOR2 text for `input`, synthesizing it first via
/// `command` if it is not already BTOR2.
pub fn ensure_btor2(
    input: &Path,
    top_module: &str,
    command: Option<&SynthCommand>,
) -> Result<String> {
    if is_btor2(input) {
        return Ok(std::fs::read_to_string(input)?);
    }

    let command = command.ok_or_else(|| {
        format!(
            "'{}' is not a .btor2 file and no synthesis command was given",
            input.display()
        )
    })?;

    let output = std::env::temp_dir().join(format!(
        "{}.btor2",
        input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("design")
    ));
    command.run(input, top_module, &output)?;
    Ok(std::fs::read_to_string(output)?)
}
