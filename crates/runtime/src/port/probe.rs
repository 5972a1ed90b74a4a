//! Ancestor-process command-line inspection.
//!
//! The editor's extension host is a grandchild of the process that was
//! launched with `--remote-debugging-port`, so the port resolver walks up the
//! process tree looking for the flag. How the tree is read is
//! platform-specific; platforms without a probe skip the step.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Upper bound on any external process a probe spawns.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the full command lines of the current process's ancestors.
#[async_trait]
pub trait AncestorCommandLineProbe: Send + Sync {
	/// Short name for diagnostics.
	fn name(&self) -> &'static str;

	/// Command lines of up to `max_depth` ancestors, nearest (the parent) first.
	///
	/// Never fails; an unreadable tree yields whatever was collected so far.
	async fn ancestor_command_lines(&self, max_depth: usize) -> Vec<String>;
}

/// Picks the probe for the current platform.
pub fn default_probe() -> Box<dyn AncestorCommandLineProbe> {
	if cfg!(target_os = "linux") {
		Box::new(ProcfsProbe::new())
	} else if cfg!(target_os = "macos") {
		Box::new(PsProbe)
	} else if cfg!(windows) {
		Box::new(PowerShellProbe)
	} else {
		Box::new(NoopProbe)
	}
}

/// Probe for platforms without process inspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

#[async_trait]
impl AncestorCommandLineProbe for NoopProbe {
	fn name(&self) -> &'static str {
		"none"
	}

	async fn ancestor_command_lines(&self, _max_depth: usize) -> Vec<String> {
		Vec::new()
	}
}

/// Walks `/proc/<pid>/stat` and `/proc/<pid>/cmdline`.
#[derive(Debug, Clone)]
pub struct ProcfsProbe {
	root: PathBuf,
	start_pid: Option<u32>,
}

impl ProcfsProbe {
	pub fn new() -> Self {
		Self {
			root: PathBuf::from("/proc"),
			start_pid: None,
		}
	}

	/// Reads a procfs-shaped tree at `root`, starting from the ancestors of `pid`.
	pub fn with_root(root: impl Into<PathBuf>, pid: u32) -> Self {
		Self {
			root: root.into(),
			start_pid: Some(pid),
		}
	}
}

impl Default for ProcfsProbe {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl AncestorCommandLineProbe for ProcfsProbe {
	fn name(&self) -> &'static str {
		"procfs"
	}

	async fn ancestor_command_lines(&self, max_depth: usize) -> Vec<String> {
		let pid = self.start_pid.unwrap_or_else(std::process::id);
		let mut lines = Vec::new();
		let Some(mut current) = procfs_parent(&self.root, pid).await else {
			return lines;
		};

		for _ in 0..max_depth {
			if current == 0 {
				break;
			}
			if let Some(line) = procfs_cmdline(&self.root, current).await {
				lines.push(line);
			}
			match procfs_parent(&self.root, current).await {
				Some(parent) if parent != current => current = parent,
				_ => break,
			}
		}
		lines
	}
}

async fn procfs_cmdline(root: &Path, pid: u32) -> Option<String> {
	let raw = tokio::fs::read(root.join(pid.to_string()).join("cmdline")).await.ok()?;
	let line = raw
		.split(|b| *b == 0)
		.filter(|part| !part.is_empty())
		.map(|part| String::from_utf8_lossy(part).into_owned())
		.collect::<Vec<_>>()
		.join(" ");
	(!line.is_empty()).then_some(line)
}

async fn procfs_parent(root: &Path, pid: u32) -> Option<u32> {
	let stat = tokio::fs::read_to_string(root.join(pid.to_string()).join("stat")).await.ok()?;
	parse_stat_ppid(&stat)
}

/// `pid (comm) state ppid ...`; `comm` may itself contain spaces and parentheses.
fn parse_stat_ppid(stat: &str) -> Option<u32> {
	let (_, rest) = stat.rsplit_once(')')?;
	rest.split_whitespace().nth(1)?.parse().ok()
}

/// Walks the tree with `ps -o ppid=,command= -p <pid>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsProbe;

#[async_trait]
impl AncestorCommandLineProbe for PsProbe {
	fn name(&self) -> &'static str {
		"ps"
	}

	async fn ancestor_command_lines(&self, max_depth: usize) -> Vec<String> {
		let walk = async {
			let mut lines = Vec::new();
			let Some((mut current, _)) = ps_entry(std::process::id()).await else {
				return lines;
			};
			for _ in 0..max_depth {
				if current <= 1 {
					break;
				}
				let Some((parent, command)) = ps_entry(current).await else {
					break;
				};
				lines.push(command);
				if parent == current {
					break;
				}
				current = parent;
			}
			lines
		};

		match tokio::time::timeout(PROBE_TIMEOUT, walk).await {
			Ok(lines) => lines,
			Err(_) => {
				debug!(target: "pilot.port", probe = "ps", "ancestor walk timed out");
				Vec::new()
			}
		}
	}
}

async fn ps_entry(pid: u32) -> Option<(u32, String)> {
	let pid = pid.to_string();
	let output = Command::new("ps")
		.args(["-o", "ppid=,command=", "-p", pid.as_str()])
		.stdin(Stdio::null())
		.stderr(Stdio::null())
		.kill_on_drop(true)
		.output()
		.await
		.ok()?;
	if !output.status.success() {
		return None;
	}
	parse_ps_line(&String::from_utf8_lossy(&output.stdout))
}

fn parse_ps_line(stdout: &str) -> Option<(u32, String)> {
	let line = stdout.lines().next()?.trim_start();
	let (ppid, command) = line.split_once(char::is_whitespace)?;
	Some((ppid.parse().ok()?, command.trim().to_string()))
}

/// Queries `Win32_Process` through a temporary PowerShell script.
///
/// The script is written to a temp file (avoiding command-line quoting) and
/// removed afterwards whatever the outcome; the PowerShell process is
/// killed if it outlives [`PROBE_TIMEOUT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellProbe;

#[async_trait]
impl AncestorCommandLineProbe for PowerShellProbe {
	fn name(&self) -> &'static str {
		"powershell"
	}

	async fn ancestor_command_lines(&self, max_depth: usize) -> Vec<String> {
		match tokio::time::timeout(PROBE_TIMEOUT, run_powershell_walk(max_depth)).await {
			Ok(Ok(lines)) => lines,
			Ok(Err(e)) => {
				debug!(target: "pilot.port", probe = "powershell", error = %e, "ancestor walk failed");
				Vec::new()
			}
			Err(_) => {
				debug!(target: "pilot.port", probe = "powershell", "ancestor walk timed out");
				Vec::new()
			}
		}
	}
}

async fn run_powershell_walk(max_depth: usize) -> std::io::Result<Vec<String>> {
	let mut file = tempfile::Builder::new().prefix("cdp-detect-").suffix(".ps1").tempfile()?;
	file.write_all(powershell_script(std::process::id(), max_depth).as_bytes())?;
	// Closes our handle; the file itself lives until `script` drops.
	let script = file.into_temp_path();

	let mut cmd = Command::new("powershell");
	cmd.args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"])
		.arg(&*script)
		.stdin(Stdio::null())
		.stderr(Stdio::null())
		.kill_on_drop(true);
	#[cfg(windows)]
	cmd.creation_flags(0x0800_0000); // CREATE_NO_WINDOW

	let output = cmd.output().await;
	if let Err(e) = script.close() {
		debug!(target: "pilot.port", error = %e, "failed to remove probe script");
	}

	let output = output?;
	Ok(String::from_utf8_lossy(&output.stdout)
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_string)
		.collect())
}

fn powershell_script(pid: u32, max_depth: usize) -> String {
	format!(
		r#"[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
$self = Get-CimInstance Win32_Process -Filter "ProcessId = {pid}" -ErrorAction SilentlyContinue
if (-not $self) {{ exit 0 }}
$current = $self.ParentProcessId
for ($i = 0; $i -lt {max_depth}; $i++) {{
    if (-not $current -or $current -eq 0) {{ break }}
    $proc = Get-CimInstance Win32_Process -Filter "ProcessId = $current" -ErrorAction SilentlyContinue
    if (-not $proc) {{ break }}
    if ($proc.CommandLine) {{ Write-Output ($proc.CommandLine -replace "`r|`n", " ") }}
    if ($proc.ParentProcessId -eq $current) {{ break }}
    $current = $proc.ParentProcessId
}}
"#
	)
}
