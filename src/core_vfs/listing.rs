use chrono::{DateTime, Duration as ChronoDuration, Local};
use std::time::SystemTime;

const DEFAULT_OWNER: &str = "ftp";
const HIDDEN_OWNER: &str = "nobody";

/// One directory entry as shown by LIST.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub mode: u32,
    pub links: u64,
    pub modified: SystemTime,
    pub owner: String,
    pub group: String,
}

impl DirEntry {
    pub fn from_metadata(name: String, meta: &std::fs::Metadata, hide_owner: bool) -> Self {
        let owner = if hide_owner { HIDDEN_OWNER } else { DEFAULT_OWNER };
        Self {
            name,
            is_dir: meta.is_dir(),
            is_symlink: meta.file_type().is_symlink(),
            size: meta.len(),
            mode: file_mode(meta),
            links: link_count(meta),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            owner: owner.to_string(),
            group: owner.to_string(),
        }
    }
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

#[cfg(unix)]
fn link_count(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.nlink()
}

#[cfg(not(unix))]
fn link_count(_meta: &std::fs::Metadata) -> u64 {
    1
}

/// `drwxr-xr-x` style permission string.
pub fn mode_string(is_dir: bool, is_symlink: bool, mode: u32) -> String {
    let kind = if is_dir {
        'd'
    } else if is_symlink {
        'l'
    } else {
        '-'
    };
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Date column: time of day for the last six months, the year otherwise.
pub fn format_list_time(modified: SystemTime, now: DateTime<Local>) -> String {
    let modified: DateTime<Local> = modified.into();
    let six_months = ChronoDuration::days(182);
    if modified > now - six_months && modified <= now + ChronoDuration::hours(1) {
        modified.format("%b %e %H:%M").to_string()
    } else {
        modified.format("%b %e  %Y").to_string()
    }
}

/// One `ls -l` line, without the terminator.
pub fn format_long(entry: &DirEntry, now: DateTime<Local>) -> String {
    format!(
        "{} {:>3} {:<8} {:<8} {:>12} {} {}",
        mode_string(entry.is_dir, entry.is_symlink, entry.mode),
        entry.links,
        entry.owner,
        entry.group,
        entry.size,
        format_list_time(entry.modified, now),
        entry.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn entry(name: &str, is_dir: bool, mode: u32, modified: SystemTime) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            is_dir,
            is_symlink: false,
            size: 2134,
            mode,
            links: 1,
            modified,
            owner: "ftp".to_string(),
            group: "ftp".to_string(),
        }
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(true, false, 0o755), "drwxr-xr-x");
        assert_eq!(mode_string(false, false, 0o644), "-rw-r--r--");
        assert_eq!(mode_string(false, true, 0o777), "lrwxrwxrwx");
        assert_eq!(mode_string(false, false, 0o100600), "-rw-------");
    }

    #[test]
    fn test_recent_and_old_dates() {
        let now = Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let recent: SystemTime = Local
            .with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
            .unwrap()
            .into();
        let old: SystemTime = Local.with_ymd_and_hms(2022, 1, 5, 9, 30, 0).unwrap().into();

        assert_eq!(format_list_time(recent, now), "Jun  1 09:30");
        assert_eq!(format_list_time(old, now), "Jan  5  2022");
    }

    #[test]
    fn test_format_long_line() {
        let now = Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let modified: SystemTime = (now - ChronoDuration::days(1)).into();
        let line = format_long(&entry("file1.txt", false, 0o644, modified), now);
        assert!(line.starts_with("-rw-r--r--   1 ftp      ftp              2134 Jun 14 12:00"));
        assert!(line.ends_with(" file1.txt"));
    }

    #[test]
    fn test_epoch_fallback_is_old() {
        let now = Local::now();
        let line = format_list_time(SystemTime::UNIX_EPOCH + Duration::from_secs(86_400 * 3), now);
        assert!(line.ends_with("1970"));
    }
}
