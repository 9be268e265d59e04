//! Interactive controller commands.
//!
//! Each stdin line is either input for the focused terminal or, when it
//! starts with `:`, a controller command. A leading `::` sends the rest of the
//! line, starting with one `:`, as input.

use crate::tab::TabKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Toggle split, mirroring the focused window in the new panel
    Split,
    /// Toggle split, leaving the new panel empty
    SplitBare,
    /// Switch focus between the panels
    Focus,
    /// Show the file browser, optionally at a path
    Files(Option<String>),
    /// Navigate the file browser one level up
    Up,
    Git,
    /// Show the commit diff in the git browser
    Commit(String),
    /// Show a file's working-tree diff in the git browser
    Diff(String),
    /// Close the git diff pane
    Log,
    /// Reload the active browser
    Refresh,
    /// Back to the terminal view
    Terminal,
    /// Switch the focused panel to another window of its session
    Window(u32),
    Session { name: String, window: u32 },
    Reconnect,
    /// Report that connectivity came back
    Online,
    Ratio(f32),
    /// Viewport width in pixels
    Width(u32),
    /// Pinned drawer width in pixels
    Drawer(u32),
    /// Dispose a cached, hidden tab
    Close(TabKey),
    Layout,
    Help,
    Quit,
}

/// One parsed stdin line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Input(String),
    Command(ControlCommand),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command :{0} (try :help)")]
    Unknown(String),

    #[error(":{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid argument for :{command}: {value}")]
    InvalidArgument { command: &'static str, value: String },
}

pub const HELP: &str = "\
:split            toggle split (right panel mirrors the focused window)
:split-bare       toggle split with an empty right panel
:focus            switch focus between panels
:files [PATH]     file browser         :up        parent directory
:git              git browser          :commit H  show commit diff
:diff PATH        show file diff       :log       close the diff
:refresh          reload browser
:term             terminal view        :window N  switch window
:session NAME [N] attach to another session
:reconnect        reconnect now        :online    network restored
:ratio R          divider ratio        :width PX  viewport width
:drawer PX        drawer width         :close KEY dispose a hidden tab
:layout           print layout         :quit      exit
::text            send a line starting with ':'";

/// Parse one line from stdin
pub fn parse_line(line: &str) -> Result<Line, CommandError> {
    if let Some(rest) = line.strip_prefix("::") {
        return Ok(Line::Input(format!(":{rest}")));
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Line::Input(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let command = match name {
        "split" => ControlCommand::Split,
        "split-bare" => ControlCommand::SplitBare,
        "focus" => ControlCommand::Focus,
        "files" => ControlCommand::Files(arg.map(str::to_string)),
        "up" => ControlCommand::Up,
        "git" => ControlCommand::Git,
        "commit" => ControlCommand::Commit(required("commit", arg)?.to_string()),
        "diff" => ControlCommand::Diff(required("diff", arg)?.to_string()),
        "log" => ControlCommand::Log,
        "refresh" => ControlCommand::Refresh,
        "term" | "terminal" => ControlCommand::Terminal,
        "window" => ControlCommand::Window(parse_arg("window", arg)?),
        "session" => {
            let name = required("session", arg)?.to_string();
            let window = match parts.next() {
                Some(value) => parse_arg("session", Some(value))?,
                None => 0,
            };
            ControlCommand::Session { name, window }
        }
        "reconnect" => ControlCommand::Reconnect,
        "online" => ControlCommand::Online,
        "ratio" => ControlCommand::Ratio(parse_arg("ratio", arg)?),
        "width" => ControlCommand::Width(parse_arg("width", arg)?),
        "drawer" => ControlCommand::Drawer(parse_arg("drawer", arg)?),
        "close" => ControlCommand::Close(parse_arg("close", arg)?),
        "layout" => ControlCommand::Layout,
        "help" | "h" | "?" => ControlCommand::Help,
        "quit" | "q" | "exit" => ControlCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Line::Command(command))
}

fn required<'a>(command: &'static str, arg: Option<&'a str>) -> Result<&'a str, CommandError> {
    arg.ok_or(CommandError::MissingArgument(command))
}

fn parse_arg<T: std::str::FromStr>(
    command: &'static str,
    arg: Option<&str>,
) -> Result<T, CommandError> {
    let value = required(command, arg)?;
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}
