use anyhow::{bail, Context, Result};

/// Fixed tag prepended to every version reply.
#[cfg(target_os = "linux")]
pub const PLATFORM_PREFIX: &str = "Linux";
#[cfg(target_os = "macos")]
pub const PLATFORM_PREFIX: &str = "macOS";
#[cfg(target_os = "windows")]
pub const PLATFORM_PREFIX: &str = "Windows";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const PLATFORM_PREFIX: &str = std::env::consts::OS;

/// Reads the OS version fresh and formats it as `"<prefix> <version>"`.
///
/// The value is never cached; each call reflects the platform state at call
/// time.
pub fn platform_version() -> Result<String> {
    let number = version_number()?;
    Ok(format!("{PLATFORM_PREFIX} {number}"))
}

#[cfg(target_os = "linux")]
fn version_number() -> Result<String> {
    let raw = std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .context("failed to read /proc/sys/kernel/osrelease")?;
    let release = raw.trim();
    if release.is_empty() {
        bail!("kernel reported an empty release string");
    }
    Ok(release.to_string())
}

#[cfg(target_os = "macos")]
fn version_number() -> Result<String> {
    let output = std::process::Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .context("failed to run sw_vers")?;
    if !output.status.success() {
        bail!("sw_vers exited with {}", output.status);
    }
    let stdout = String::from_utf8(output.stdout).context("sw_vers produced non-UTF-8 output")?;
    let release = stdout.trim();
    if release.is_empty() {
        bail!("sw_vers reported an empty version");
    }
    Ok(release.to_string())
}

#[cfg(target_os = "windows")]
fn version_number() -> Result<String> {
    let output = std::process::Command::new("cmd")
        .args(["/C", "ver"])
        .output()
        .context("failed to run `cmd /C ver`")?;
    if !output.status.success() {
        bail!("`ver` exited with {}", output.status);
    }
    // `ver` prints e.g. `Microsoft Windows [Version 10.0.22631.3447]`.
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_once("[Version ")
        .and_then(|(_, rest)| rest.split_once(']'))
        .map(|(version, _)| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .context("could not parse a version out of `ver` output")
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn version_number() -> Result<String> {
    bail!(
        "no version source available for target os `{}`",
        std::env::consts::OS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn version_reads_prefix_then_number() {
        let reply = platform_version().unwrap();
        let number = reply
            .strip_prefix(PLATFORM_PREFIX)
            .and_then(|rest| rest.strip_prefix(' '))
            .unwrap();
        assert!(!number.is_empty());
        assert!(!number.contains('\n'));
    }
}
