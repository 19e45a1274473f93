use std::path::PathBuf;

const APP_DIR: &str = "spotlite";

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!("{}/spotlite-mpv.sock", std::env::temp_dir().display())
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    "spotlite-mpv".to_string()
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket: &str) -> String {
    format!("--input-ipc-server={}", socket)
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", socket)
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/spotlite on both macOS and Linux
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SPOTLITE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

/// Find the mpv binary: beside the current exe first, then `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let exe_name = mpv_binary_name();

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local_mpv = dir.join(exe_name);
            if local_mpv.exists() {
                return Some(local_mpv);
            }
        }
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(exe_name))
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirs_are_namespaced() {
        assert!(data_dir().ends_with("spotlite"));
    }

    #[cfg(unix)]
    #[test]
    fn socket_arg_points_at_socket() {
        assert_eq!(
            mpv_socket_arg("/tmp/x.sock"),
            "--input-ipc-server=/tmp/x.sock"
        );
    }
}
