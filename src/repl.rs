use crate::catalog::ModelCatalog;
use crate::error::Result;
use crate::session::Session;
use crate::transport::Transport;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

pub const SELECT_BANNER: &str = "\nBefore you begin, please specify the model you want to use.\n(Type \"models\" to list local models)\n";
pub const RESELECT_BANNER: &str = "\nPlease specify the model you want to use.\n";
pub const ASK_BANNER: &str = "\nAsk anything. Type \"exit\" to exit!\n";
pub const NEXT_BANNER: &str = "\nGot a new question?\n";

const EXIT_COMMAND: &str = "exit";
const MODELS_COMMAND: &str = "models";

/// Line-oriented front end: picks a model, then runs turns until the user
/// types `exit` or input ends.
pub struct Repl<'t, R, W> {
    transport: &'t Transport,
    input: R,
    out: W,
}

impl<'t, R, W> Repl<'t, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(transport: &'t Transport, input: R, out: W) -> Self {
        Self {
            transport,
            input,
            out,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let Some(model) = self.select_model().await? else {
            return Ok(());
        };

        let mut session = Session::new(model);
        self.converse(&mut session).await
    }

    /// Returns the chosen model, or `None` if the user asked to exit.
    pub async fn select_model(&mut self) -> Result<Option<String>> {
        self.say(SELECT_BANNER)?;

        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            let input = line.trim();

            match input {
                EXIT_COMMAND => return Ok(None),
                "" => self.say(SELECT_BANNER)?,
                MODELS_COMMAND => {
                    let names = ModelCatalog::new(self.transport).list_base_names().await?;
                    for name in &names {
                        writeln!(self.out, "{}", name)?;
                    }
                    self.say(RESELECT_BANNER)?;
                }
                name => {
                    if ModelCatalog::new(self.transport).is_available(name).await? {
                        info!(model = name, "model selected");
                        return Ok(Some(name.to_string()));
                    }
                    self.say(&format!(
                        "\nModel \"{}\" not found. Type \"models\" to list local models.\n",
                        name
                    ))?;
                }
            }
        }
    }

    pub async fn converse(&mut self, session: &mut Session) -> Result<()> {
        self.say(ASK_BANNER)?;

        loop {
            let Some(prompt) = self.read_line().await? else {
                return Ok(());
            };

            match prompt.trim() {
                EXIT_COMMAND => return Ok(()),
                "" => self.say(ASK_BANNER)?,
                _ => {
                    session
                        .run_turn(self.transport, &prompt, &mut self.out)
                        .await?;
                    self.say(NEXT_BANNER)?;
                }
            }
        }
    }

    /// Next input line without its terminator. Invalid UTF-8 is replaced
    /// rather than treated as a read failure.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(None);
        }

        if raw.last() == Some(&b'\n') {
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
