//! Human-readable status lines for the CLI's `INFO` command.

use crate::error::CResult;
use crate::storage::Status;

pub fn get_info(status: CResult<Status>) -> Vec<String> {
    let mut infos = Vec::new();
    infos.push("KV Storage:".to_string());

    match status {
        Ok(status) => {
            infos.push(format!("  engine: {}", status.name));
            infos.push(format!("  keys: {}", status.keys));
            infos.push(format!("  live size: {} bytes", status.size));
            infos.push(format!("  total disk size: {} bytes", status.total_disk_size));
            infos.push(format!("  live disk size: {} bytes", status.live_disk_size));
            infos.push(format!("  garbage disk size: {} bytes", status.garbage_disk_size));
        }
        Err(err) => infos.push(format!("  status unavailable: {err}")),
    }

    infos
}
