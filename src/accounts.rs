//! Account database parsing.
//!
//! Reads passwd(5) records: `name:password:uid:gid:gecos:home:shell`.

/// One account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub home: String,
}

/// Parse passwd-format text. Blank lines, comments and malformed records
/// (missing fields or a non-numeric uid) are skipped.
pub fn parse_passwd(content: &str) -> Vec<Account> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 || fields[0].is_empty() {
                tracing::debug!("Skipping malformed account record: {:?}", line);
                return None;
            }
            let uid = fields[2].parse().ok()?;
            Some(Account {
                name: fields[0].to_string(),
                uid,
                home: fields[5].to_string(),
            })
        })
        .collect()
}

/// Accounts that the cleanup deletes: uid at or above `min_uid`, not protected.
pub fn deletable_accounts<'a>(
    accounts: &'a [Account],
    min_uid: u32,
    protected: &[String],
) -> Vec<&'a Account> {
    accounts
        .iter()
        .filter(|a| a.uid >= min_uid)
        .filter(|a| !protected.iter().any(|p| p == &a.name))
        .collect()
}
