//! Canned task links and titles shaped like the remote service produces.

/// Build a task reference path for the given series and package.
///
/// `None` targets the development series (the `+source` pseudo-series).
#[must_use]
pub fn task_link(series: Option<&str>, package: &str, bug: &str) -> String {
    match series {
        Some(series) => format!(
            "https://api.launchpad.net/devel/ubuntu/{series}/+source/{package}/+bug/{bug}"
        ),
        None => format!("https://api.launchpad.net/devel/ubuntu/+source/{package}/+bug/{bug}"),
    }
}

/// Build a task title in the shape the service renders for a
/// distro-source-package target.
#[must_use]
pub fn bug_title(number: &str, package: &str, summary: &str) -> String {
    format!("Bug #{number} in {package} (Ubuntu): \"{summary}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launchpad::TaskPath;

    #[test]
    fn test_task_link_parses_back() {
        let path = TaskPath::parse(&task_link(Some("focal"), "qemu", "42")).unwrap();
        assert_eq!(path.series, "focal");
        assert_eq!(path.source_package_name, "qemu");

        let devel = TaskPath::parse(&task_link(None, "qemu", "42")).unwrap();
        assert_eq!(devel.series, TaskPath::DEVEL_SERIES);
    }

    #[test]
    fn test_bug_title_token_shape() {
        let title = bug_title("42", "qemu", "boots backwards");
        let tokens: Vec<&str> = title.split(' ').collect();
        assert_eq!(tokens[1], "#42");
        assert_eq!(tokens[3], "qemu");
    }
}
