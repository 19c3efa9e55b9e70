// Line-oriented front-end for a drawing session

use crate::bitmap::{save_images, CanvasSession, Ink};
use crate::transmit::Transmitter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  PenDown(i32, i32, Ink),
  PenMove(i32, i32),
  PenUp,
  Stroke(Vec<(i32, i32)>, Ink),
  BrushUp,
  BrushDown,
  Brush(u32),
  Clear,
  Process,
  Show,
  Save,
  Send,
  Help,
  Quit,
}

pub const HELP: &str = "\
Commands (coordinates are display pixels, canvas pixel x scale):
  down X Y        start a stroke          erase X Y    start an erasing stroke
  move X Y        continue the stroke     up           end the stroke
  line X Y X Y..  draw a polyline         rub X Y X Y..  erase along a polyline
  brush +|-|N     change brush radius (1..=10)
  c, clear        clear the canvas        p, process   downscale to 28x28
  show            print the canvas        s, save      export PNG and raw bytes
  send            downscale and transmit  q, quit      leave";

fn parse_i32(s: &str) -> Result<i32, String> {
  s.parse::<i32>().map_err(|e| format!("invalid coordinate '{}': {}", s, e))
}

fn parse_point(args: &[&str]) -> Result<(i32, i32), String> {
  match args {
    [x, y] => Ok((parse_i32(x)?, parse_i32(y)?)),
    _ => Err("expected two coordinates: X Y".to_string()),
  }
}

fn parse_points(args: &[&str]) -> Result<Vec<(i32, i32)>, String> {
  if args.is_empty() || args.len() % 2 != 0 {
    return Err("expected coordinate pairs: X Y [X Y ...]".to_string());
  }
  args.chunks(2).map(parse_point).collect()
}

pub fn parse_command(line: &str) -> Result<Command, String> {
  let words: Vec<&str> = line.split_whitespace().collect();
  let Some((&cmd, args)) = words.split_first() else {
    return Err("empty command".to_string());
  };

  match cmd {
    "down" => parse_point(args).map(|(x, y)| Command::PenDown(x, y, Ink::Draw)),
    "erase" => parse_point(args).map(|(x, y)| Command::PenDown(x, y, Ink::Erase)),
    "move" => parse_point(args).map(|(x, y)| Command::PenMove(x, y)),
    "up" => Ok(Command::PenUp),
    "line" => parse_points(args).map(|pts| Command::Stroke(pts, Ink::Draw)),
    "rub" => parse_points(args).map(|pts| Command::Stroke(pts, Ink::Erase)),
    "brush" => match args {
      ["+"] => Ok(Command::BrushUp),
      ["-"] => Ok(Command::BrushDown),
      [n] => n
        .parse::<u32>()
        .map(Command::Brush)
        .map_err(|e| format!("invalid brush size '{}': {}", n, e)),
      _ => Err("usage: brush +|-|N".to_string()),
    },
    "c" | "clear" => Ok(Command::Clear),
    "p" | "process" => Ok(Command::Process),
    "show" => Ok(Command::Show),
    "s" | "save" => Ok(Command::Save),
    "send" => Ok(Command::Send),
    "h" | "help" | "?" => Ok(Command::Help),
    "q" | "quit" | "exit" => Ok(Command::Quit),
    other => Err(format!("Unknown command: '{}'. Type 'help' for a list.", other)),
  }
}

/// Apply one command to the session. Returns `false` when the shell should exit.
///
/// Failures of `save`/`send` are reported and the session carries on; the
/// user re-issues the command.
pub fn execute(
  cmd: Command,
  session: &mut CanvasSession,
  transmitter: &mut dyn Transmitter,
  save_dir: &Path,
) -> bool {
  match cmd {
    Command::PenDown(x, y, ink) => session.pen_down((x, y), ink),
    Command::PenMove(x, y) => session.pen_move((x, y)),
    Command::PenUp => session.pen_up(),
    Command::Stroke(points, ink) => session.stroke(&points, ink),
    Command::BrushUp => println!("Brush size: {}", session.brush_up()),
    Command::BrushDown => println!("Brush size: {}", session.brush_down()),
    Command::Brush(n) => println!("Brush size: {}", session.set_brush(n)),
    Command::Clear => {
      session.clear();
      println!("Canvas cleared");
    },
    Command::Process => match session.process() {
      Ok(bmp) => print!("{}", bmp.render_ascii()),
      Err(e) => eprintln!("Error: {}", e),
    },
    Command::Show => print!("{}", session.canvas().render_ascii()),
    Command::Save => {
      if let Err(e) = save_images(session, save_dir) {
        eprintln!("Error saving images: {}", e);
      }
    },
    Command::Send => match session.payload() {
      Ok(payload) => match transmitter.send(&payload) {
        Ok(n) => println!("Sent {} bytes to {}.", n, transmitter.target()),
        Err(e) => eprintln!("Error sending data: {}", e),
      },
      Err(e) => eprintln!("Error: {}", e),
    },
    Command::Help => println!("{}", HELP),
    Command::Quit => return false,
  }
  true
}

/// Interactive loop until `q`, Ctrl-C or Ctrl-D.
pub fn run_shell(session: &mut CanvasSession, transmitter: &mut dyn Transmitter, save_dir: &Path) -> io::Result<()> {
  let mut editor = DefaultEditor::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
  println!("Drawing session: {}x{} canvas, brush {}", session.canvas().width(), session.canvas().height(), session.brush());
  println!("{}", HELP);

  loop {
    match editor.readline("(nnhost) ") {
      Ok(line) => {
        let trimmed = line.trim();
        if trimmed.is_empty() {
          continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match parse_command(trimmed) {
          Ok(cmd) => {
            if !execute(cmd, session, transmitter, save_dir) {
              return Ok(());
            }
          },
          Err(msg) => eprintln!("Error: {}", msg),
        }
      },
      Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
      Err(err) => return Err(io::Error::new(io::ErrorKind::Other, err)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bitmap::{AreaDownsampler, CANVAS_SIZE, PAYLOAD_LEN, TARGET_SIZE};
  use crate::transmit::TransmitError;

  #[derive(Default)]
  struct Recorder {
    sent: Vec<Vec<u8>>,
  }

  impl Transmitter for Recorder {
    fn target(&self) -> String {
      "recorder".to_string()
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, TransmitError> {
      self.sent.push(payload.to_vec());
      Ok(payload.len())
    }
  }

  #[test]
  fn test_parse_commands() {
    assert_eq!(parse_command("down 10 20"), Ok(Command::PenDown(10, 20, Ink::Draw)));
    assert_eq!(parse_command("erase 1 2"), Ok(Command::PenDown(1, 2, Ink::Erase)));
    assert_eq!(parse_command("  move 3 4 "), Ok(Command::PenMove(3, 4)));
    assert_eq!(
      parse_command("line 0 0 50 50 100 0"),
      Ok(Command::Stroke(vec![(0, 0), (50, 50), (100, 0)], Ink::Draw))
    );
    assert_eq!(parse_command("brush +"), Ok(Command::BrushUp));
    assert_eq!(parse_command("brush 7"), Ok(Command::Brush(7)));
    assert_eq!(parse_command("c"), Ok(Command::Clear));
    assert_eq!(parse_command("q"), Ok(Command::Quit));
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse_command("").is_err());
    assert!(parse_command("down 10").is_err());
    assert!(parse_command("line 1 2 3").is_err());
    assert!(parse_command("move a b").is_err());
    assert!(parse_command("brush big").is_err());
    assert!(parse_command("fly").is_err());
  }

  #[test]
  fn test_execute_draw_and_send() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = CanvasSession::new(CANVAS_SIZE, TARGET_SIZE, 5, 5, Box::new(AreaDownsampler));
    let mut tx = Recorder::default();

    for line in ["line 100 100 400 400", "send", "clear", "send"] {
      let cmd = parse_command(line).unwrap();
      assert!(execute(cmd, &mut session, &mut tx, dir.path()));
    }
    assert!(!execute(Command::Quit, &mut session, &mut tx, dir.path()));

    assert_eq!(tx.sent.len(), 2);
    assert_eq!(tx.sent[0].len(), PAYLOAD_LEN);
    assert!(tx.sent[0].iter().any(|&p| p > 0));
    assert!(tx.sent[1].iter().all(|&p| p == 0));
  }
}
