//! Interactive questions asked on the terminal.
use std::io::{BufRead, IsTerminal as _, Write};
use std::sync::Mutex;

/// Source of answers to yes/no, menu and free-text questions.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt {
    /// Ask a yes/no question; an empty answer picks `default`.
    fn confirm(&self, question: &str, default: bool) -> bool;

    /// Ask the user to pick one of `options`; an empty answer picks
    /// `default`. Returns `None` when no answer can be read.
    fn choose(&self, question: &str, options: &[String], default: usize) -> Option<usize>;

    /// Ask for a line of text. Returns `None` for an empty answer.
    fn input(&self, question: &str) -> Option<String>;
}

/// Pick the prompt for this run: the terminal when stdin is one and the
/// caller allows questions, otherwise [`NonInteractive`].
#[must_use]
pub fn for_session(interactive: bool) -> Box<dyn Prompt> {
    if interactive && std::io::stdin().is_terminal() {
        Box::new(TerminalPrompt::stdio())
    } else {
        Box::new(NonInteractive)
    }
}

/// Answers every question with its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompt for NonInteractive {
    fn confirm(&self, _question: &str, default: bool) -> bool {
        default
    }

    fn choose(&self, _question: &str, _options: &[String], _default: usize) -> Option<usize> {
        None
    }

    fn input(&self, _question: &str) -> Option<String> {
        None
    }
}

/// Line-based prompt over a reader and a writer.
///
/// Questions go to the writer (stderr for [`TerminalPrompt::stdio`]) so
/// they never mix with command output on stdout.
pub struct TerminalPrompt {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for TerminalPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPrompt").finish_non_exhaustive()
    }
}

impl TerminalPrompt {
    /// Prompt on the process's stdin and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::with_io(
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stderr()),
        )
    }

    /// Prompt on arbitrary streams.
    #[must_use]
    pub fn with_io(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    fn say(&self, text: &str) {
        if let Ok(mut out) = self.output.lock() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    /// Read one trimmed line; `None` on end of input or a read error.
    fn read_answer(&self) -> Option<String> {
        let mut line = String::new();
        let read = self.input.lock().ok()?.read_line(&mut line).ok()?;
        (read > 0).then(|| line.trim().to_string())
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            self.say(&format!("{question} {hint} "));
            let Some(answer) = self.read_answer() else {
                return default;
            };
            match answer.to_lowercase().as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.say("Please answer 'y' or 'n'.\n"),
            }
        }
    }

    fn choose(&self, question: &str, options: &[String], default: usize) -> Option<usize> {
        use std::fmt::Write as _;
        if options.is_empty() {
            return None;
        }
        let default = default.min(options.len() - 1);
        let mut menu = format!("{question}\n");
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(menu, "  {}) {option}", i + 1);
        }
        self.say(&menu);
        loop {
            self.say(&format!("Select 1-{} [{}]: ", options.len(), default + 1));
            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Some(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Some(n - 1),
                _ => self.say("Invalid choice.\n"),
            }
        }
    }

    fn input(&self, question: &str) -> Option<String> {
        self.say(&format!("{question}: "));
        self.read_answer().filter(|a| !a.is_empty())
    }
}
