//! Line-oriented editing commands
//!
//! One command per line, arguments separated by whitespace. Double quotes group
//! words, and inside quotes `\n`, `\"` and `\\` are escapes. Lines starting with
//! `//` are comments.
//!
//! ```text
//! text "Wish you were here"
//! select last
//! move 300 120
//! background #ffcc00
//! undo
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use cardling_core::{Color, Point};

/// Which object a `select` command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Position in z-order, bottom first
    Index(usize),
    /// Topmost object
    Last,
    None,
}

/// A text or brush style change
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    Font(String),
    FontSize(f64),
    Fill(Color),
    TextBackground(Option<Color>),
    BrushColor(Color),
    BrushWidth(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Image(PathBuf),
    /// Freehand stroke through absolute canvas points
    Draw(Vec<Point>),
    Rect { width: f64, height: f64 },
    Ellipse { radius_x: f64, radius_y: f64 },
    Line { from: Point, to: Point },
    Background(Option<Color>),
    BackgroundImage(PathBuf),
    Clear,
    Select(Selector),
    Copy,
    Delete,
    Move(Point),
    Rotate(f64),
    Style(StyleChange),
    /// Apply the current text style to the selected text
    Restyle,
    Undo,
    Redo,
    Export(PathBuf),
    Share,
    Status,
    Help,
}

pub const HELP: &str = "\
commands:
  text \"CONTENT\"            add text at the canvas center
  image PATH                 add an image at half scale
  draw X,Y X,Y ...           freehand stroke with the current brush
  rect W H | ellipse RX RY   add a shape at the canvas center
  line X,Y X,Y               add a straight line
  background COLOR|none      set or remove the background color
  pattern PATH               use an image as the background
  clear                      remove everything
  select N|last|none         select by z-order
  copy | delete              duplicate or remove the selection
  move X Y | rotate DEG      transform the selection
  font NAME | size N | fill COLOR | highlight COLOR|none
  brush COLOR | width N      brush settings
  restyle                    apply the text style to the selected text
  undo | redo
  export PATH                write the postcard as SVG
  share                      print a share link and QR code
  status | help";

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return Ok(None);
    }

    let words = tokenize(trimmed)?;
    let Some((name, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "text" => Command::Text(rest(args, "text")?),
        "image" => Command::Image(PathBuf::from(single(args, "image")?)),
        "draw" => {
            if args.is_empty() {
                bail!("draw needs at least one X,Y point");
            }
            Command::Draw(args.iter().map(|a| point(a)).collect::<Result<_>>()?)
        }
        "rect" => {
            let [w, h] = pair(args, "rect")?;
            Command::Rect {
                width: number(w)?,
                height: number(h)?,
            }
        }
        "ellipse" => {
            let [rx, ry] = pair(args, "ellipse")?;
            Command::Ellipse {
                radius_x: number(rx)?,
                radius_y: number(ry)?,
            }
        }
        "line" => {
            let [from, to] = pair(args, "line")?;
            Command::Line {
                from: point(from)?,
                to: point(to)?,
            }
        }
        "background" | "bg" => Command::Background(optional_color(single(args, "background")?)?),
        "pattern" => Command::BackgroundImage(PathBuf::from(single(args, "pattern")?)),
        "clear" => Command::Clear,
        "select" => Command::Select(match single(args, "select")? {
            "last" => Selector::Last,
            "none" => Selector::None,
            n => Selector::Index(n.parse().with_context(|| format!("bad index `{n}`"))?),
        }),
        "copy" => Command::Copy,
        "delete" => Command::Delete,
        "move" => {
            let [x, y] = pair(args, "move")?;
            Command::Move(Point::new(number(x)?, number(y)?))
        }
        "rotate" => Command::Rotate(number(single(args, "rotate")?)?),
        "font" => Command::Style(StyleChange::Font(rest(args, "font")?)),
        "size" => Command::Style(StyleChange::FontSize(positive(single(args, "size")?)?)),
        "fill" => Command::Style(StyleChange::Fill(color(single(args, "fill")?)?)),
        "highlight" => {
            let highlight = optional_color(single(args, "highlight")?)?;
            Command::Style(StyleChange::TextBackground(highlight))
        }
        "brush" => Command::Style(StyleChange::BrushColor(color(single(args, "brush")?)?)),
        "width" => Command::Style(StyleChange::BrushWidth(positive(single(args, "width")?)?)),
        "restyle" => Command::Restyle,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "export" => Command::Export(PathBuf::from(single(args, "export")?)),
        "share" => Command::Share,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        other => bail!("unknown command `{other}`, try `help`"),
    };
    Ok(Some(command))
}

/// Split on whitespace, keeping quoted runs together
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => current.push('\n'),
                            Some(escaped) => current.push(escaped),
                            None => bail!("dangling escape at end of line"),
                        },
                        Some(other) => current.push(other),
                        None => bail!("unterminated quote"),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn single<'a>(args: &'a [String], command: &str) -> Result<&'a str> {
    match args {
        [only] => Ok(only.as_str()),
        _ => bail!("{command} takes exactly one argument"),
    }
}

fn pair<'a>(args: &'a [String], command: &str) -> Result<[&'a str; 2]> {
    match args {
        [a, b] => Ok([a.as_str(), b.as_str()]),
        _ => bail!("{command} takes exactly two arguments"),
    }
}

/// All arguments joined back together, so unquoted text works too
fn rest(args: &[String], command: &str) -> Result<String> {
    if args.is_empty() {
        bail!("{command} needs an argument");
    }
    Ok(args.join(" "))
}

fn number(s: &str) -> Result<f64> {
    let value: f64 = s.parse().with_context(|| format!("bad number `{s}`"))?;
    if !value.is_finite() {
        bail!("`{s}` is not a finite number");
    }
    Ok(value)
}

fn positive(s: &str) -> Result<f64> {
    let value = number(s)?;
    if value <= 0.0 {
        bail!("`{s}` must be greater than zero");
    }
    Ok(value)
}

fn point(s: &str) -> Result<Point> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("bad point `{s}`, expected X,Y"))?;
    Ok(Point::new(number(x.trim())?, number(y.trim())?))
}

fn color(s: &str) -> Result<Color> {
    Ok(s.parse::<Color>()?)
}

fn optional_color(s: &str) -> Result<Option<Color>> {
    if s.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        color(s).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("// a note").unwrap().is_none());
    }

    #[test]
    fn quoted_text_with_escapes() {
        assert_eq!(
            parse(r#"text "Dear \"Sam\"\nSee you soon""#),
            Command::Text("Dear \"Sam\"\nSee you soon".into())
        );
        assert_eq!(parse("text hello there"), Command::Text("hello there".into()));
        assert!(parse_line(r#"text "open"#).is_err());
    }

    #[test]
    fn geometry_commands() {
        assert_eq!(
            parse("draw 10,10 20,15 30,10"),
            Command::Draw(vec![
                Point::new(10.0, 10.0),
                Point::new(20.0, 15.0),
                Point::new(30.0, 10.0)
            ])
        );
        assert_eq!(
            parse("rect 100 50"),
            Command::Rect {
                width: 100.0,
                height: 50.0
            }
        );
        assert_eq!(
            parse("line 0,0 100,100"),
            Command::Line {
                from: Point::new(0.0, 0.0),
                to: Point::new(100.0, 100.0)
            }
        );
        assert_eq!(parse("move 300 200"), Command::Move(Point::new(300.0, 200.0)));
        assert!(parse_line("move 1").is_err());
        assert!(parse_line("rotate NaN").is_err());
        assert!(parse_line("draw").is_err());
    }

    #[test]
    fn colors_and_styles() {
        assert_eq!(
            parse("background #ffcc00"),
            Command::Background(Some(Color::rgb(0xff, 0xcc, 0x00)))
        );
        assert_eq!(parse("bg none"), Command::Background(None));
        assert_eq!(
            parse("font Comic Sans"),
            Command::Style(StyleChange::Font("Comic Sans".into()))
        );
        assert_eq!(parse("width 8"), Command::Style(StyleChange::BrushWidth(8.0)));
        assert!(parse_line("size 0").is_err());
        assert!(parse_line("fill blue").is_err());
    }

    #[test]
    fn selection() {
        assert_eq!(parse("select 2"), Command::Select(Selector::Index(2)));
        assert_eq!(parse("select last"), Command::Select(Selector::Last));
        assert_eq!(parse("select none"), Command::Select(Selector::None));
        assert!(parse_line("select -1").is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = parse_line("explode").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
        assert_eq!(parse("UNDO"), Command::Undo);
    }
}
