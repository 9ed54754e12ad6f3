use std::path::{Path, PathBuf};

use chrono::Duration;

pub trait Display {
    fn to_display(&self) -> String;
}

impl Display for Duration {
    fn to_display(&self) -> String {
        let millis = self.num_milliseconds();
        if millis < 1000 {
            return format!("{}ms", millis.max(0));
        }
        let seconds = millis / 1000;
        let minutes = seconds / 60;
        let remain_seconds = seconds % 60;
        let remain_millis = millis % 1000;
        if minutes == 0 {
            return format!("{}.{:0>3}s", remain_seconds, remain_millis);
        }
        format!("{}m {:0>2}.{:0>3}s", minutes, remain_seconds, remain_millis)
    }
}

impl Display for PathBuf {
    fn to_display(&self) -> String {
        self.to_str()
            .unwrap_or("Path with invalid(s) character(s)")
            .to_string()
    }
}

impl Display for &Path {
    fn to_display(&self) -> String {
        self.to_str()
            .unwrap_or("Path with invalid(s) character(s)")
            .to_string()
    }
}
