use std::{fs, path::Path};

use lazarus_model::WorkerId;

const FALLBACK_NAME: &str = "worker";

/// Fresh worker id rooted at the host identity.
///
/// Inside a container the container id is used, otherwise the hostname.
/// A random suffix is always appended: a restarted process on the same host
/// must not inherit the queues of its dead predecessor, those belong to the
/// cleaner.
pub fn default_worker_id() -> WorkerId {
    WorkerId::with_prefix(&host_name())
}

fn host_name() -> String {
    if let Some(id) = container_id() {
        return id;
    }
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

fn container_id() -> Option<String> {
    if !Path::new("/.dockerenv").exists() {
        return None;
    }
    let cgroup = fs::read_to_string("/proc/self/cgroup").ok()?;
    parse_container_id(&cgroup)
}

fn parse_container_id(cgroup: &str) -> Option<String> {
    for line in cgroup.lines() {
        if let Some(part) = line.split('/').find(|s| s.starts_with("docker-")) {
            let id = part.trim_start_matches("docker-").trim_end_matches(".scope");
            if !id.is_empty() {
                return Some(short(id));
            }
        }
        if let Some(id) = line
            .split("/docker/")
            .nth(1)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Some(short(id));
        }
    }
    None
}

fn short(id: &str) -> String {
    id.chars().take(12).collect()
}
