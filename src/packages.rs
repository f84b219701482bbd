//! Parsing apt query output.

use std::collections::BTreeSet;

/// Direct dependency names from `apt-cache depends` output.
///
/// Only `Depends` and `PreDepends` relations count (alternatives marked
/// with `|` included). Virtual packages (`<name>`) are skipped.
pub fn parse_depends(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let relation = line.trim_start().trim_start_matches('|');
            let (kind, name) = relation.split_once(':')?;
            if kind != "Depends" && kind != "PreDepends" {
                return None;
            }
            let name = name.trim();
            if name.is_empty() || name.starts_with('<') {
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}

/// One package name per line, as printed by `apt-mark showmanual/showauto`.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Packages to protect: the base groups plus their direct dependencies.
pub fn protected_set(base: &[String], depends_output: &str) -> BTreeSet<String> {
    let mut set = parse_depends(depends_output);
    set.extend(base.iter().filter(|b| !b.trim().is_empty()).cloned());
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPENDS: &str = "\
ubuntu-minimal
  Depends: adduser
  Depends: apt
 |Depends: netplan.io
  Depends: ifupdown
  Depends: <awk>
    mawk
    original-awk
  PreDepends: dpkg
  Recommends: rsyslog
  Suggests: ubuntu-standard
ubuntu-standard
  Depends: apt
  Depends: less
  Breaks: popularity-contest
";

    #[test]
    fn test_parse_depends() {
        let deps: Vec<String> = parse_depends(DEPENDS).into_iter().collect();
        assert_eq!(
            deps,
            vec!["adduser", "apt", "dpkg", "ifupdown", "less", "netplan.io"]
        );
    }

    #[test]
    fn test_protected_set_includes_groups() {
        let base = vec!["ubuntu-minimal".to_string(), "ubuntu-standard".to_string()];
        let set = protected_set(&base, DEPENDS);
        assert!(set.contains("ubuntu-minimal"));
        assert!(set.contains("ubuntu-standard"));
        assert!(set.contains("dpkg"));
        assert!(!set.contains("rsyslog"));
        assert!(!set.contains("mawk"));
    }

    #[test]
    fn test_parse_package_list() {
        let list = parse_package_list("vim\n  curl \n\nhtop\n");
        assert_eq!(list, vec!["vim", "curl", "htop"]);
        assert!(parse_package_list("\n\n").is_empty());
    }
}
