// src/exec/command.rs

use std::fmt;
use std::path::{Path, PathBuf};

/// Fully resolved argument vector for the supervised child.
///
/// Built as `command... ENTRY ARGS...`; with an empty `command` the entry
/// point itself is the program, resolved against `cwd` so a bare file name
/// is not looked up on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl ChildCommand {
    pub fn new(command: &[String], entry: &Path, child_args: &[String], cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();

        let (program, mut args) = match command.split_first() {
            Some((program, rest)) => {
                let mut args = rest.to_vec();
                args.push(entry.to_string_lossy().into_owned());
                (program.clone(), args)
            }
            None => (cwd.join(entry).to_string_lossy().into_owned(), Vec::new()),
        };
        args.extend(child_args.iter().cloned());

        Self { program, args, cwd }
    }
}

impl fmt::Display for ChildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn interpreter_prefix_then_entry_then_args() {
        let cmd = ChildCommand::new(
            &strings(&["node", "--enable-source-maps"]),
            Path::new("server.js"),
            &strings(&["--port", "3000"]),
            "/app",
        );
        assert_eq!(cmd.program, "node");
        assert_eq!(cmd.args, strings(&["--enable-source-maps", "server.js", "--port", "3000"]));
        assert_eq!(cmd.to_string(), "node --enable-source-maps server.js --port 3000");
    }

    #[test]
    fn empty_command_runs_entry_directly() {
        let cmd = ChildCommand::new(&[], Path::new("serve.sh"), &strings(&["-v"]), "/app");
        assert_eq!(cmd.program, "/app/serve.sh");
        assert_eq!(cmd.args, strings(&["-v"]));

        let cmd = ChildCommand::new(&[], Path::new("/opt/bin/serve"), &[], "/app");
        assert_eq!(cmd.program, "/opt/bin/serve");
    }
}
