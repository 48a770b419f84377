use serde::{Deserialize, Serialize};

/// Changed paths in the working directory, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.total_changes() == 0
    }

    pub fn total_changes(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len() + self.untracked.len()
    }

    /// Every listed path with a one-letter marker, in a stable order
    pub fn entries(&self) -> Vec<(char, &str)> {
        let mut entries: Vec<(char, &str)> = [
            ('M', &self.modified),
            ('A', &self.added),
            ('D', &self.deleted),
            ('?', &self.untracked),
        ]
        .into_iter()
        .flat_map(|(marker, paths)| paths.iter().map(move |p| (marker, p.as_str())))
        .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_sorted_by_path() {
        let status = GitStatus {
            modified: vec!["src/lib.rs".to_string()],
            added: vec!["README.md".to_string()],
            deleted: vec![],
            untracked: vec!["notes.md".to_string()],
        };

        assert_eq!(
            status.entries(),
            vec![('A', "README.md"), ('?', "notes.md"), ('M', "src/lib.rs")]
        );
        assert_eq!(status.total_changes(), 3);
        assert!(GitStatus::default().is_clean());
    }
}
