use lexmap::{OutputMode, ScanResultVerbose};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(input: &str, mode: OutputMode, res: &ScanResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Normalizing: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Output ━━━", ansi::GRAY));
    println!(
        "  {} {}  {} {}",
        palette.bold(palette.paint(format!("\"{}\"", res.result.transformed), ansi::GREEN)),
        palette.dim("│ mode:"),
        palette.paint(mode.name(), ansi::BLUE),
        palette.dim(format!("({})", mode.code())),
    );

    println!("\n{}", palette.paint("━━━ Positions ━━━", ansi::GRAY));
    print_positions(res, &palette);

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    print_rules(res, &palette);

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Trie: {} nodes, {} patterns",
        palette.paint(format!("{:?}", res.elapsed), ansi::GREEN),
        palette.paint(res.details.node_count.to_string(), ansi::CYAN),
        palette.dim(res.details.pattern_count.to_string()),
    );
    println!();
}

fn print_positions(res: &ScanResultVerbose, palette: &ansi::Palette) {
    let Some(reverse) = &res.result.reverse_map else {
        println!("{}", palette.dim("  No position maps in list and set modes"));
        return;
    };
    if res.result.original.is_empty() {
        println!("{}", palette.dim("  Empty input"));
        return;
    }

    let output: Vec<char> = res.result.transformed.chars().collect();
    for (idx, (ch, range)) in res.result.original.chars().zip(reverse).enumerate() {
        let target = match range {
            Some([lo, hi]) => {
                let span: String = output.get(*lo..=*hi).map(|s| s.iter().collect()).unwrap_or_default();
                format!("{} {}", palette.paint(format!("{lo}..={hi}"), ansi::YELLOW), palette.dim(format!("{span:?}")))
            }
            None => palette.dim("dropped"),
        };
        println!("  {} {:<8} {} {}", palette.paint(format!("[{idx}]"), ansi::GRAY), format!("{ch:?}"), palette.dim("→"), target);
    }
}

fn print_rules(res: &ScanResultVerbose, palette: &ansi::Palette) {
    let metrics = &res.details.metrics;
    let settings = &res.details.settings;

    println!(
        "  {} {}  {} {}",
        palette.dim("case-sensitive:"),
        palette.paint(settings.case_sensitive.to_string(), ansi::BLUE),
        palette.dim("│ bypass:"),
        palette.paint(settings.bypass.to_string(), ansi::BLUE),
    );

    let counters = [
        ("replacements", metrics.replacements),
        ("splits", metrics.splits),
        ("re-expansions", metrics.reexpansions),
        ("backtracks", metrics.backtracks),
        ("class boundaries", metrics.boundaries),
    ];
    for (label, count) in counters {
        let value = if count > 0 {
            palette.paint(format!("✓ {count}"), ansi::GREEN)
        } else {
            palette.dim(format!("✗ {count}"))
        };
        println!("  {} {}", palette.paint(format!("{label}:"), ansi::BLUE), value);
    }
}
