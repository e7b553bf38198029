// crates/vtrans-core/src/commands.rs
//
// Every keystroke the interactive console (spec.md §4.9) recognizes is
// expressed as a ConsoleCommand — one variant per user action. vtrans-cli
// parses raw key/line input into these; vtrans-engine's Supervisor matches
// on them.

/// Which filter graph(s) a `c`/`C` console command targets.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTarget {
    All,
    Graph(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `q` — request shutdown.
    Quit,
    /// `+` / `-` — raise/lower the log level by ten (`+10`/`-10`).
    AdjustLogLevel(i32),
    /// `?` — print the help screen.
    Help,
    /// `c`/`C <target>|all <time>|-1 <command>[ <arg>]`.
    ///
    /// `time < 0.0` sends immediately (one-shot for `c`, broadcast for `C`);
    /// `time >= 0.0` queues it for that future time — only valid with `C`.
    FilterCommand {
        target: FilterTarget,
        time: f64,
        command: String,
        arg: Option<String>,
    },
}

/// Parse the body of a `c`/`C` prompt: `<target>|all <time>|-1 <command>[ <arg>]`.
///
/// `is_broadcast` distinguishes `c` (one-shot, `time` must be `< 0`) from `C`
/// (broadcast/queue, any `time` allowed) per spec.md §4.9.
pub fn parse_filter_command(is_broadcast: bool, line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.trim().splitn(4, ' ');
    let target_tok = parts.next().ok_or("missing target")?;
    let time_tok = parts.next().ok_or("missing time")?;
    let command = parts.next().ok_or("missing command")?.to_string();
    let arg = parts.next().map(str::to_string);

    let target = if target_tok.eq_ignore_ascii_case("all") {
        FilterTarget::All
    } else {
        let idx = target_tok
            .parse::<usize>()
            .map_err(|_| format!("invalid target '{target_tok}'"))?;
        FilterTarget::Graph(idx)
    };

    let time = time_tok
        .parse::<f64>()
        .map_err(|_| format!("invalid time '{time_tok}'"))?;

    if time >= 0.0 && !is_broadcast {
        return Err("queueing a command at a future time requires 'C', not 'c'".to_string());
    }

    Ok(ConsoleCommand::FilterCommand { target, time, command, arg })
}
