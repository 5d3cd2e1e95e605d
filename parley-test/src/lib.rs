// Integration test utilities and fixtures for Parley.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use parley_core::analyze::{AnalysisBackend, LocalBackend, SourceKind};
use parley_core::config::AnalysisSection;
use parley_core::types::{AnalysisParams, NetworkGraph};

// ── Fixtures ─────────────────────────────────────────────────────

/// A small family chat: four people, a system line, a multi-line message
/// and one sender known only by phone number.
pub const SAMPLE_CHAT: &str = "\
[01.03.2024, 09:00:00] Ann created group \"Family\"
[01.03.2024, 09:01:12] Ann: Good morning everyone
[01.03.2024, 09:02:40] Ben: Morning! Who is picking up grandma?
[01.03.2024, 09:03:05] Ann: I can do it after lunch
and bring the cake too
[01.03.2024, 09:05:00] \u{202a}+49 170 1234567\u{202c}: I'll be there at three
[01.03.2024, 09:06:30] Ben: Great, thanks
[02.03.2024, 18:20:00] Cat: Sorry I missed this, the cake was lovely
[02.03.2024, 18:21:10] Ann: Glad you liked it
[02.03.2024, 18:22:45] Cat: Next time I bring dessert
[03.03.2024, 08:00:00] Ben: Photos from yesterday
";

/// A talk page with two sections and a reply chain.
pub const SAMPLE_TALK: &str = "\
{{Talk header}}

== Infobox image ==
The current image is blurry. [[User:Alice|Alice]] ([[User talk:Alice|talk]]) 14:02, 3 March 2024 (UTC)
:Agreed, I can look for a better one. [[User:Bob]] 15:10, 3 March 2024 (UTC)
::Found one on Commons. [[User:Carol|Carol]] 16:45, 3 March 2024 (UTC)
:::Looks good to me. [[User:Alice|Alice]] 17:00, 3 March 2024 (UTC)

== Sources ==
Is the 2019 source reliable? [[User:Bob|Bob]] 09:00, 12 April 2024 (UTC)
:It is peer reviewed. [[User:Dave|Dave]] 10:30, 12 April 2024 (UTC)
";

/// A temporary directory holding conversation files.
#[derive(Debug)]
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    /// A fixture containing `chat.txt` and `talk.txt`.
    pub fn with_samples() -> Self {
        let fixture = Self::new();
        fixture.write("chat.txt", SAMPLE_CHAT);
        fixture.write("talk.txt", SAMPLE_TALK);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a network from a file with default analysis settings.
pub async fn analyze_file(
    path: &Path,
    kind: SourceKind,
    params: &AnalysisParams,
) -> NetworkGraph {
    let backend = LocalBackend::new(kind, AnalysisSection::default());
    backend
        .analyze(path.to_str().expect("utf-8 path"), params)
        .await
        .expect("local analysis")
}

/// A chat export of `messages` lines spread over `participants` senders.
pub fn synthetic_chat(participants: usize, messages: usize) -> String {
    let mut out = String::new();
    for i in 0..messages {
        let minute = i % 60;
        let hour = (i / 60) % 24;
        let day = 1 + (i / 1440) % 28;
        let sender = (i * 7) % participants;
        let _ = writeln!(
            out,
            "[{day:02}.03.2024, {hour:02}:{minute:02}:00] P{sender}: message number {i}"
        );
    }
    out
}
