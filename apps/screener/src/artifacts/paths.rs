//! Deterministic artifact addressing.
//!
//! Postings and candidates are identified by their directories. Every key is
//! derived from the lexically normalized absolute directory, and every place a
//! (posting, candidate) pair appears in a file name goes through [`slugify`]
//! applied to the directory's identity. The identity never depends on the
//! directory the process happens to run from.

use std::path::{Component, Path, PathBuf};

use super::ArtifactKey;

pub const POSTING_FILE: &str = "posting.txt";
pub const PRODUCT_CONTEXT_FILE: &str = "product_info.txt";
pub const SCREENING_REPORT_FILE: &str = "screening_report.json";
pub const SCREENING_SUMMARY_FILE: &str = "screening_summary.md";
pub const PRODUCT_PROFILE_FILE: &str = "product_profile.json";
pub const REQUIREMENTS_FILE: &str = "questions.json";
pub const RESUME_FILE: &str = "resume.md";
pub const EXPERIENCES_FILE: &str = "experiences.md";

const EVALUATIONS_DIR: &str = "evaluations";
const SUMMARIES_DIR: &str = "summaries";
const ROLE_ALIGNMENTS_DIR: &str = "role_alignments";

/// Filesystem-safe slug: every non-alphanumeric character becomes `_`, ASCII
/// letters are lowercased.
///
/// Identifiers that differ only in punctuation collapse to the same slug
/// (`a-b` and `a.b` both become `a_b`).
pub fn slugify(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolves `path` against `base` and folds `.`/`..` without touching the
/// filesystem.
fn normalize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The posting/candidate pair a stage invocation operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub posting: PathBuf,
    pub candidate: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
    root: Option<PathBuf>,
    prompts_dir: PathBuf,
}

impl PathResolver {
    /// `base` is the directory relative arguments are resolved against
    /// (normally the process working directory). `root`, when given, must be
    /// absolute and anchors identity slugs; without it identities are full
    /// absolute paths. `prompts_dir` holds the static instruction assets.
    pub fn new(base: impl Into<PathBuf>, root: Option<&Path>, prompts_dir: &Path) -> Self {
        let base = base.into();
        let root = root.map(|root| normalize(Path::new("/"), root));
        let prompts_dir = normalize(&base, prompts_dir);
        Self {
            base,
            root,
            prompts_dir,
        }
    }

    /// Builds a target; the candidate defaults to the posting directory.
    pub fn target(&self, posting_dir: &Path, candidate_dir: Option<&Path>) -> Target {
        let posting = normalize(&self.base, posting_dir);
        let candidate = candidate_dir
            .map(|dir| normalize(&self.base, dir))
            .unwrap_or_else(|| posting.clone());
        Target { posting, candidate }
    }

    /// Identity string of a directory: relative to the root when one is
    /// configured and contains it, otherwise every component of the absolute
    /// path.
    pub fn relative_identity(&self, dir: &Path) -> String {
        let dir = normalize(&self.base, dir);
        let relative = match self.root.as_deref().map(|root| dir.strip_prefix(root)) {
            Some(Ok(rel)) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => dir,
        };

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn slug(&self, dir: &Path) -> String {
        slugify(&self.relative_identity(dir))
    }

    pub fn asset(&self, file_name: &str) -> ArtifactKey {
        ArtifactKey::new(self.prompts_dir.join(file_name))
    }

    fn in_posting(&self, target: &Target, file_name: &str) -> ArtifactKey {
        ArtifactKey::new(target.posting.join(file_name))
    }

    fn in_candidate(&self, target: &Target, file_name: &str) -> ArtifactKey {
        ArtifactKey::new(target.candidate.join(file_name))
    }

    pub fn posting_text(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, POSTING_FILE)
    }

    pub fn product_context(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, PRODUCT_CONTEXT_FILE)
    }

    pub fn screening_report(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, SCREENING_REPORT_FILE)
    }

    pub fn screening_summary(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, SCREENING_SUMMARY_FILE)
    }

    pub fn product_profile(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, PRODUCT_PROFILE_FILE)
    }

    pub fn requirements(&self, target: &Target) -> ArtifactKey {
        self.in_posting(target, REQUIREMENTS_FILE)
    }

    pub fn resume(&self, target: &Target) -> ArtifactKey {
        self.in_candidate(target, RESUME_FILE)
    }

    pub fn experiences(&self, target: &Target) -> ArtifactKey {
        self.in_candidate(target, EXPERIENCES_FILE)
    }

    pub fn candidate_evaluation(&self, target: &Target) -> ArtifactKey {
        let name = format!("{}_evaluation.json", self.slug(&target.candidate));
        ArtifactKey::new(target.posting.join(EVALUATIONS_DIR).join(name))
    }

    pub fn executive_summary(&self, target: &Target) -> ArtifactKey {
        let name = format!("{}_summary.md", self.slug(&target.candidate));
        ArtifactKey::new(target.posting.join(SUMMARIES_DIR).join(name))
    }

    pub fn role_alignment(&self, target: &Target) -> ArtifactKey {
        let name = format!(
            "{}_{}_role_alignment.json",
            self.slug(&target.candidate),
            self.slug(&target.posting)
        );
        ArtifactKey::new(target.candidate.join(ROLE_ALIGNMENTS_DIR).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/work", Some(Path::new("/work")), Path::new("prompts"))
    }

    #[test]
    fn test_slugify_replaces_punctuation_and_lowercases() {
        assert_eq!(
            slugify("VLS/Dept-Name/Senior Eng!"),
            "vls_dept_name_senior_eng_"
        );
    }

    #[test]
    fn test_slugify_maps_non_ascii_to_filler() {
        assert_eq!(slugify("Zoë"), "zo_");
    }

    #[test]
    fn test_slugify_punctuation_only_difference_collapses() {
        assert_eq!(slugify("acme/senior-eng"), slugify("acme/senior.eng"));
    }

    #[test]
    fn test_slugify_alphanumeric_difference_is_preserved() {
        assert_ne!(slugify("acme/eng-1"), slugify("acme/eng-2"));
        assert_ne!(slugify("acme/eng"), slugify("acme/eng2"));
    }

    #[test]
    fn test_normalize_folds_dot_segments() {
        let path = normalize(Path::new("/work"), Path::new("postings/./acme/../globex"));
        assert_eq!(path, PathBuf::from("/work/postings/globex"));
    }

    #[test]
    fn test_target_defaults_candidate_to_posting() {
        let target = resolver().target(Path::new("postings/acme"), None);
        assert_eq!(target.posting, PathBuf::from("/work/postings/acme"));
        assert_eq!(target.candidate, target.posting);
    }

    #[test]
    fn test_relative_and_absolute_arguments_produce_identical_keys() {
        let r = resolver();
        let a = r.target(Path::new("postings/acme/"), Some(Path::new("candidates/alice")));
        let b = r.target(
            Path::new("/work/postings/./acme"),
            Some(Path::new("/work/candidates/alice")),
        );
        assert_eq!(r.role_alignment(&a), r.role_alignment(&b));
        assert_eq!(r.candidate_evaluation(&a), r.candidate_evaluation(&b));
    }

    #[test]
    fn test_relative_identity_outside_root_keeps_full_path() {
        let r = PathResolver::new("/work", Some(Path::new("/work/postings")), Path::new("prompts"));
        assert_eq!(r.relative_identity(Path::new("/work/postings/acme/eng")), "acme/eng");
        assert_eq!(
            r.relative_identity(Path::new("/srv/candidates/alice")),
            "srv/candidates/alice"
        );
    }

    #[test]
    fn test_keys_do_not_depend_on_working_directory() {
        let from_top = PathResolver::new("/abs", None, Path::new("prompts"));
        let from_candidates = PathResolver::new("/abs/candidates", None, Path::new("prompts"));

        let a = from_top.target(Path::new("postings/acme"), Some(Path::new("candidates/alice")));
        let b = from_candidates.target(Path::new("../postings/acme"), Some(Path::new("alice")));

        assert_eq!(a, b);
        assert_eq!(from_top.candidate_evaluation(&a), from_candidates.candidate_evaluation(&b));
        assert_eq!(from_top.executive_summary(&a), from_candidates.executive_summary(&b));
        assert_eq!(from_top.role_alignment(&a), from_candidates.role_alignment(&b));
        assert_eq!(
            from_top.candidate_evaluation(&a),
            ArtifactKey::from("/abs/postings/acme/evaluations/abs_candidates_alice_evaluation.json")
        );
    }

    #[test]
    fn test_configured_root_is_shared_across_working_directories() {
        let root = Some(Path::new("/abs"));
        let from_top = PathResolver::new("/abs", root, Path::new("prompts"));
        let from_elsewhere = PathResolver::new("/tmp/scratch", root, Path::new("prompts"));

        let a = from_top.target(Path::new("postings/acme"), Some(Path::new("candidates/alice")));
        let b = from_elsewhere.target(
            Path::new("/abs/postings/acme"),
            Some(Path::new("/abs/candidates/alice")),
        );
        assert_eq!(
            from_top.candidate_evaluation(&a),
            from_elsewhere.candidate_evaluation(&b)
        );
        assert_eq!(from_top.slug(&a.candidate), "candidates_alice");
    }

    #[test]
    fn test_posting_scoped_keys_live_in_posting_dir() {
        let r = resolver();
        let t = r.target(Path::new("postings/acme"), None);
        assert_eq!(
            r.requirements(&t),
            ArtifactKey::from("/work/postings/acme/questions.json")
        );
        assert_eq!(
            r.screening_summary(&t),
            ArtifactKey::from("/work/postings/acme/screening_summary.md")
        );
    }

    #[test]
    fn test_pair_keys_use_candidate_and_posting_slugs() {
        let r = resolver();
        let t = r.target(
            Path::new("postings/VLS/Dept-Name/Senior Eng!"),
            Some(Path::new("candidates/Alice")),
        );
        assert_eq!(
            r.candidate_evaluation(&t),
            ArtifactKey::from(
                "/work/postings/VLS/Dept-Name/Senior Eng!/evaluations/candidates_alice_evaluation.json"
            )
        );
        assert_eq!(
            r.executive_summary(&t),
            ArtifactKey::from(
                "/work/postings/VLS/Dept-Name/Senior Eng!/summaries/candidates_alice_summary.md"
            )
        );
        assert_eq!(
            r.role_alignment(&t),
            ArtifactKey::from(
                "/work/candidates/Alice/role_alignments/candidates_alice_postings_vls_dept_name_senior_eng__role_alignment.json"
            )
        );
    }

    #[test]
    fn test_distinct_candidates_get_distinct_pair_keys() {
        let r = resolver();
        let c1 = r.target(Path::new("postings/acme"), Some(Path::new("candidates/alice")));
        let c2 = r.target(Path::new("postings/acme"), Some(Path::new("candidates/alicia")));
        assert_ne!(r.candidate_evaluation(&c1), r.candidate_evaluation(&c2));
        assert_ne!(r.executive_summary(&c1), r.executive_summary(&c2));
    }

    #[test]
    fn test_assets_resolve_under_prompts_dir() {
        assert_eq!(
            resolver().asset("job-screening-prompt.txt"),
            ArtifactKey::from("/work/prompts/job-screening-prompt.txt")
        );
    }
}
