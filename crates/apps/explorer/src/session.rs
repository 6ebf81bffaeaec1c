//! Line-oriented interaction loop over a loaded controller.

use std::io::{self, BufRead, Write};

use scene::{Interaction, RecordKeys, Renderer, SceneController};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Interact(Interaction),
    /// Select the n-th (1-based) bound mark of the current view.
    Pick(usize),
    Quit,
}

/// Accepts `select <key>`, `back`, `quit` and their one-letter forms, or a
/// bare number picking from the listed options.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb {
        "select" | "s" if !rest.is_empty() => Some(Command::Interact(Interaction::select(rest))),
        "back" | "b" if rest.is_empty() => Some(Command::Interact(Interaction::Back)),
        "quit" | "q" | "exit" if rest.is_empty() => Some(Command::Quit),
        _ if rest.is_empty() => line.parse().ok().filter(|&n| n > 0).map(Command::Pick),
        _ => None,
    }
}

/// Renderer that can report which select keys the last view bound.
pub trait Bindings {
    fn bindings(&self) -> &[String];
    fn back_enabled(&self) -> bool;
}

impl Bindings for crate::svg::SvgRenderer {
    fn bindings(&self) -> &[String] {
        crate::svg::SvgRenderer::bindings(self)
    }

    fn back_enabled(&self) -> bool {
        crate::svg::SvgRenderer::back_enabled(self)
    }
}

/// Renders the initial view, then applies commands from `input` until it is
/// exhausted or a quit command arrives. Returns the number of renders.
pub fn run<R, K, T, I, O>(
    controller: &mut SceneController<R, K>,
    renderer: &mut T,
    input: I,
    mut out: O,
) -> Result<usize, T::Error>
where
    K: RecordKeys<R>,
    T: Renderer + Bindings,
    T::Error: From<io::Error>,
    I: BufRead,
    O: Write,
{
    controller.render(renderer)?;
    let mut renders = 1;
    prompt(&mut out, renderer)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let interaction = match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Interact(interaction)) => interaction,
            Some(Command::Pick(n)) => match renderer.bindings().get(n - 1) {
                Some(key) => Interaction::select(key.clone()),
                None => {
                    writeln!(out, "no option {n}")?;
                    continue;
                }
            },
            None => {
                warn!(input = %line.trim(), "unrecognised command");
                writeln!(out, "commands: select <key> | back | quit | <number>")?;
                continue;
            }
        };
        if controller.handle(&interaction, renderer)? {
            renders += 1;
            prompt(&mut out, renderer)?;
        } else {
            writeln!(out, "nothing to do in {}", controller.state().scene())?;
        }
    }
    Ok(renders)
}

fn prompt<T: Bindings, O: Write>(out: &mut O, renderer: &T) -> io::Result<()> {
    for (i, key) in renderer.bindings().iter().enumerate() {
        writeln!(out, "  {:>3}. {key}", i + 1)?;
    }
    if renderer.back_enabled() {
        writeln!(out, "  back")?;
    }
    out.flush()
}
