pub mod config;

use crate::error::Result;
use crate::logger::{log, LogSeverity::*};
use crate::structure::{combine, load_structure, save_structure, Offset, Structure};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

pub use config::SessionConfig;

pub const HELP: &str = "\
Valid commands (in the order you'll probably execute them) are:
author <name>
    Sets the author of the output structure.
source <directory>
    Sets what directory to load and save structures to.
origin <x> <y> <z>
    Sets where in the output structure to put future loaded input structures.
load <filename>
    Loads an input structure into the output structure.
shift <x> <y> <z>
    Shifts all blocks and entities.
save <filename>
    Saves the structure. Use a .json name to save the flat-text mirror.
clear
    Restarts progress after confirming that you really want to.
exit
    Exits the program after confirming that you really want to.
help
    Shows this list.";

/// Whether the session keeps reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Three-digit code the user must type back to confirm a destructive command.
pub fn confirmation_code() -> String {
    format!("{:03}", rand::thread_rng().gen_range(0..1000))
}

/// Parses `x y z`, flooring fractional input.
pub fn parse_coordinates(args: &[&str]) -> Option<Offset> {
    if args.len() != 3 {
        return None;
    }
    let mut axes = [0i32; 3];
    for (axis, arg) in axes.iter_mut().zip(args) {
        let value = arg.parse::<f64>().ok()?.floor();
        if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
            return None;
        }
        *axis = value as i32;
    }
    Some(Offset::from(axes))
}

/// Adds `.nbt` unless the name already ends in a structure extension.
pub fn structure_file_name(name: &str) -> String {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("nbt") | Some("json") => name.to_owned(),
        _ => format!("{}.nbt", name),
    }
}

/// Interactive editor: reads commands line by line and builds one output
/// structure out of the structures it loads.
pub struct Session<R, W> {
    lines: Lines<R>,
    out: W,
    config: SessionConfig,
    author: String,
    source: PathBuf,
    origin: Offset,
    structure: Option<Structure>,
    confirm_code: Box<dyn FnMut() -> String + Send>,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, out: W, config: SessionConfig) -> Self {
        Session {
            lines: reader.lines(),
            out,
            author: config.author.clone(),
            source: config.source.clone(),
            origin: config.origin(),
            config,
            structure: None,
            confirm_code: Box::new(confirmation_code),
        }
    }

    /// Replaces the generator of confirmation codes.
    pub fn with_confirmation_codes<F>(mut self, codes: F) -> Self
    where
        F: FnMut() -> String + Send + 'static,
    {
        self.confirm_code = Box::new(codes);
        self
    }

    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn origin(&self) -> Offset {
        self.origin
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs commands until `exit` is confirmed or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        self.say(HELP).await?;
        loop {
            self.out.write_all(b"> ").await?;
            self.out.flush().await?;
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            match self.execute(&line).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => {
                    log(format!("Command {:?} failed: {}", line.trim(), err), Error);
                    self.say(&format!("Error ({}): {}", err.kind(), err)).await?;
                }
            }
        }
        self.out.flush().await
    }

    /// Runs one command line. A failing command leaves the session as it was.
    pub async fn execute(&mut self, line: &str) -> Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };
        log(format!("Running command: {}", line.trim()), Debug);
        match command.to_ascii_lowercase().as_str() {
            "author" => self.author_command(args).await?,
            "source" => self.source_command(args).await?,
            "origin" => self.origin_command(args).await?,
            "load" => self.load_command(args).await?,
            "shift" => self.shift_command(args).await?,
            "save" => self.save_command(args).await?,
            "clear" => self.clear_command().await?,
            "exit" => return self.exit_command().await,
            "help" => self.say(HELP).await?,
            other => {
                self.say(&format!("Unknown command \"{}\". Type help for a list.", other))
                    .await?
            }
        }
        Ok(Flow::Continue)
    }

    async fn say(&mut self, msg: &str) -> io::Result<()> {
        self.out.write_all(msg.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Prints `question` and reads the answer. End of input answers `None`.
    async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.out.write_all(question.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|answer| answer.trim().to_owned()))
    }

    async fn confirm(&mut self, action: &str) -> io::Result<bool> {
        let code = (self.confirm_code)();
        let answer = self
            .ask(&format!(
                "Type {} to confirm that you really want to {}: ",
                code, action
            ))
            .await?;
        Ok(answer.as_deref() == Some(code.as_str()))
    }

    async fn author_command(&mut self, args: &[&str]) -> Result<()> {
        if args.is_empty() {
            let msg = format!("Author is currently set to \"{}\".", self.author);
            self.say(&msg).await?;
        } else {
            self.author = args.join(" ");
            let msg = format!("Author is now set to \"{}\".", self.author);
            self.say(&msg).await?;
        }
        Ok(())
    }

    async fn source_command(&mut self, args: &[&str]) -> Result<()> {
        if args.is_empty() {
            let msg = format!("Source is currently set to \"{}\".", self.source.display());
            self.say(&msg).await?;
            return Ok(());
        }
        let directory = PathBuf::from(args.join(" "));
        let is_dir = tokio::fs::metadata(&directory)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if is_dir {
            let msg = format!("Source is now set to \"{}\".", directory.display());
            self.source = directory;
            self.say(&msg).await?;
        } else {
            let msg = format!(
                "Error: folder \"{}\" does not exist!",
                directory.display()
            );
            self.say(&msg).await?;
        }
        Ok(())
    }

    async fn origin_command(&mut self, args: &[&str]) -> Result<()> {
        if args.is_empty() {
            let msg = format!("Origin is currently set to {}.", self.origin);
            self.say(&msg).await?;
            return Ok(());
        }
        match parse_coordinates(args) {
            Some(origin) => {
                self.origin = origin;
                self.say(&format!("Origin is now set to {}.", origin)).await?;
            }
            None => {
                self.say("Invalid coordinates. Example command: origin 23 -5 1")
                    .await?
            }
        }
        Ok(())
    }

    async fn load_command(&mut self, args: &[&str]) -> Result<()> {
        if args.is_empty() {
            self.say("Please provide a file name!").await?;
            return Ok(());
        }
        let path = self.source.join(structure_file_name(&args.join(" ")));
        let mut data = load_structure(&path).await?;

        if !data.has_single_palette()? {
            let len = data.palette_layout()?.variant_count();
            let question = format!(
                "This structure has {} palettes.\n\
                 Would you like to load just one palette, or load all of them?\n\
                 Warning: loading multiple palettes for multiple structures results\n\
                 in an exponential number of palettes in the output structure!\n\
                 Type 0 to load all of them, or a number 1 - {} to load just one: ",
                len, len
            );
            let answer = self.ask(&question).await?;
            match answer.as_deref().map(str::parse::<usize>) {
                Some(Ok(0)) => {}
                Some(Ok(choice)) => data.select_variant(choice - 1)?,
                _ => {
                    self.say("Not sure what you meant, so not loading the structure.")
                        .await?;
                    return Ok(());
                }
            }
        }

        let merged = match &self.structure {
            None => {
                data.shift(self.origin)?;
                // size is display-only and cannot describe negative
                // coordinates, so it is pinned to a single block.
                data.set_size([1, 1, 1])?;
                data
            }
            Some(current) => combine(current, &data, self.origin)?,
        };
        self.structure = Some(merged);
        log(
            format!("Loaded {} at {}", path.display(), self.origin),
            Info,
        );
        self.say("Alright, loaded structure!").await?;
        Ok(())
    }

    async fn shift_command(&mut self, args: &[&str]) -> Result<()> {
        if self.structure.is_none() {
            self.say("You don't have anything loaded! You can't shift the structure.")
                .await?;
            return Ok(());
        }
        let Some(offset) = parse_coordinates(args) else {
            self.say("Invalid coordinates. Example command: shift 18 2 -6")
                .await?;
            return Ok(());
        };
        if let Some(structure) = self.structure.as_mut() {
            structure.shift(offset)?;
        }
        self.say(&format!("Shifted structure by {}.", offset)).await?;
        Ok(())
    }

    async fn save_command(&mut self, args: &[&str]) -> Result<()> {
        let Some(mut output) = self.structure.clone() else {
            self.say("You don't have anything loaded! You can't save anything.")
                .await?;
            return Ok(());
        };
        if args.is_empty() {
            self.say("Please provide a file name!").await?;
            return Ok(());
        }
        let path = self.source.join(structure_file_name(&args.join(" ")));

        let exists = tokio::fs::metadata(&path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if exists
            && !self
                .confirm(&format!("overwrite the file \"{}\"", path.display()))
                .await?
        {
            self.say("Alright, not saving!").await?;
            return Ok(());
        }

        output.set_author(&self.author);
        save_structure(&output, &path).await?;
        self.structure = Some(output);
        let msg = format!("Alright, saved structure to \"{}\"!", path.display());
        self.say(&msg).await?;
        Ok(())
    }

    async fn clear_command(&mut self) -> Result<()> {
        if self
            .confirm("clear the structure and reset the origin")
            .await?
        {
            self.structure = None;
            self.origin = self.config.origin();
            self.say("Alright, the structure has been reset!").await?;
        } else {
            self.say("Alright, not doing anything!").await?;
        }
        Ok(())
    }

    async fn exit_command(&mut self) -> Result<Flow> {
        if self
            .confirm("exit without saving current progress")
            .await?
        {
            self.say("Alright, bye!").await?;
            Ok(Flow::Exit)
        } else {
            self.say("Alright, not exiting!").await?;
            Ok(Flow::Continue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::test_support::*;
    use crate::structure::{PALETTE, PALETTES};
    use tokio::io::BufReader;

    fn config() -> SessionConfig {
        SessionConfig {
            author: "Tester".to_owned(),
            source: std::env::temp_dir(),
            origin: [0, 0, 0],
        }
    }

    fn session(input: &'static str) -> Session<BufReader<&'static [u8]>, Vec<u8>> {
        Session::new(BufReader::new(input.as_bytes()), Vec::new(), config())
            .with_confirmation_codes(|| "123".to_owned())
    }

    fn output<R>(session: Session<R, Vec<u8>>) -> String
    where
        R: AsyncBufRead + Unpin,
    {
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_parse_coordinates_floors() {
        assert_eq!(parse_coordinates(&["1.7", "-0.5", "3"]), Some(Offset::new(1, -1, 3)));
        assert_eq!(parse_coordinates(&["1", "2"]), None);
        assert_eq!(parse_coordinates(&["1", "two", "3"]), None);
        assert_eq!(parse_coordinates(&["1", "NaN", "3"]), None);
        assert_eq!(parse_coordinates(&["1", "1e12", "3"]), None);
    }

    #[test]
    fn test_structure_file_name() {
        assert_eq!(structure_file_name("house"), "house.nbt");
        assert_eq!(structure_file_name("house.nbt"), "house.nbt");
        assert_eq!(structure_file_name("house.JSON"), "house.JSON");
        assert_eq!(structure_file_name("house.v2"), "house.v2.nbt");
    }

    #[test]
    fn test_confirmation_code_has_three_digits() {
        for _ in 0..100 {
            let code = confirmation_code();
            assert_eq!(code.len(), 3);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_author_and_origin_commands() {
        let mut session = session("");
        tokio_test::assert_ok!(session.execute("author Jane Doe").await);
        tokio_test::assert_ok!(session.execute("origin 1.5 2 -3.5").await);
        tokio_test::assert_ok!(session.execute("origin up").await);
        assert_eq!(session.author(), "Jane Doe");
        assert_eq!(session.origin(), Offset::new(1, 2, -4));

        let text = output(session);
        assert!(text.contains("Author is now set to \"Jane Doe\"."));
        assert!(text.contains("Origin is now set to 1 2 -4."));
        assert!(text.contains("Invalid coordinates."));
    }

    #[tokio::test]
    async fn test_source_rejects_missing_directory() {
        let mut session = session("");
        let before = session.source().to_path_buf();
        tokio_test::assert_ok!(session.execute("source /definitely/not/a/dir").await);
        assert_eq!(session.source(), before.as_path());
        assert!(output(session).contains("does not exist"));
    }

    #[tokio::test]
    async fn test_commands_without_structure() {
        let mut session = session("");
        tokio_test::assert_ok!(session.execute("shift 1 2 3").await);
        tokio_test::assert_ok!(session.execute("save out").await);
        tokio_test::assert_ok!(session.execute("frobnicate").await);
        let text = output(session);
        assert!(text.contains("You can't shift the structure."));
        assert!(text.contains("You can't save anything."));
        assert!(text.contains("Unknown command \"frobnicate\""));
    }

    #[tokio::test]
    async fn test_exit_needs_matching_code() {
        let mut session = session("999\n123\n");
        assert_eq!(session.execute("exit").await.unwrap(), Flow::Continue);
        assert_eq!(session.execute("exit").await.unwrap(), Flow::Exit);
        let text = output(session);
        assert!(text.contains("Alright, not exiting!"));
        assert!(text.contains("Alright, bye!"));
    }

    #[tokio::test]
    async fn test_run_reports_errors_and_continues() {
        let mut session = session("load missing-structure-file\nauthor After\n");
        tokio_test::assert_ok!(session.run().await);
        assert_eq!(session.author(), "After");
        assert!(output(session).contains("Error (Io):"));
    }

    #[tokio::test]
    async fn test_load_prompts_for_variant() {
        let dir = tempfile::TempDir::new().unwrap();
        let variants = multi_structure(
            "someone",
            &[&["minecraft:stone"], &["minecraft:granite"]],
            vec![block([0, 0, 0], 0)],
        );
        save_structure(&variants, &dir.path().join("variants.nbt")).await.unwrap();

        let mut session = Session::new(
            BufReader::new("2\n".as_bytes()),
            Vec::new(),
            SessionConfig {
                source: dir.path().to_path_buf(),
                ..config()
            },
        );
        tokio_test::assert_ok!(session.execute("origin 1 1 1").await);
        tokio_test::assert_ok!(session.execute("load variants").await);

        let structure = session.structure().unwrap();
        assert!(structure.root().get(PALETTES).is_none());
        assert_eq!(
            structure.root()[PALETTE],
            crate::nbt::Tag::List(palette(&["minecraft:granite"]))
        );
        assert_eq!(
            blocks_summary(structure.blocks().unwrap())[0].0,
            int_list(&[1, 1, 1])
        );
        assert_eq!(structure.root()["size"], int_list(&[1, 1, 1]));
        assert!(output(session).contains("This structure has 2 palettes."));
    }
}
