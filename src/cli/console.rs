//! Line-oriented terminal I/O for the interactive menu
//!
//! Every prompt reads one line. End of input surfaces as
//! `DashboardError::InputClosed` so nested menus unwind to the top loop.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Money, Period};

pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Console {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }

    /// Console over the process stdin and stdout
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdin().lock()), Box::new(io::stdout()))
    }

    /// Write text as is
    pub fn write(&mut self, text: &str) -> DashboardResult<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    /// Write one line
    pub fn say(&mut self, text: impl Display) -> DashboardResult<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Prompt and read a trimmed line; `None` at end of input
    pub fn read_line(&mut self, prompt: &str) -> DashboardResult<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.say("")?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt for a line, failing with `InputClosed` at end of input
    pub fn ask(&mut self, prompt: &str) -> DashboardResult<String> {
        self.read_line(prompt)?.ok_or(DashboardError::InputClosed)
    }

    /// Prompt until a non-empty answer is given
    pub fn ask_required(&mut self, prompt: &str) -> DashboardResult<String> {
        loop {
            let answer = self.ask(prompt)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("A value is required.")?;
        }
    }

    /// Prompt for an optional answer; blank means `None`
    pub fn ask_optional(&mut self, prompt: &str) -> DashboardResult<Option<String>> {
        let answer = self.ask(prompt)?;
        Ok(if answer.is_empty() { None } else { Some(answer) })
    }

    /// Prompt showing a default that a blank answer accepts
    pub fn ask_with_default(&mut self, prompt: &str, default: &str) -> DashboardResult<String> {
        let answer = self.ask(&format!("{} [{}]: ", prompt, default))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Prompt until the answer parses
    pub fn ask_parsed<T>(&mut self, prompt: &str, default: Option<T>) -> DashboardResult<T>
    where
        T: FromStr + Display + Clone,
    {
        loop {
            let answer = match &default {
                Some(d) => self.ask(&format!("{} [{}]: ", prompt, d))?,
                None => self.ask(&format!("{}: ", prompt))?,
            };
            if answer.is_empty() {
                if let Some(d) = &default {
                    return Ok(d.clone());
                }
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => self.say(format!("Invalid value '{}'. Try again.", answer))?,
            }
        }
    }

    /// Prompt until a valid amount is entered
    pub fn ask_money(&mut self, prompt: &str) -> DashboardResult<Money> {
        loop {
            let answer = self.ask_required(&format!("{}: ", prompt))?;
            match Money::parse(&answer) {
                Ok(amount) => return Ok(amount),
                Err(e) => self.say(format!("{}. Try again.", e))?,
            }
        }
    }

    /// Prompt until a valid period is entered; blank takes the default
    pub fn ask_period(&mut self, prompt: &str, default: Period) -> DashboardResult<Period> {
        loop {
            let answer = self.ask(&format!("{} [{}]: ", prompt, default))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match Period::parse(&answer) {
                Ok(period) => return Ok(period),
                Err(e) => self.say(format!("{}. Try again.", e))?,
            }
        }
    }

    /// Yes/no question; anything but y/yes is no
    pub fn confirm(&mut self, prompt: &str) -> DashboardResult<bool> {
        let answer = self.ask(&format!("{} [y/N]: ", prompt))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Pick one of `options` by 1-based number or by name
    pub fn choose<'o>(&mut self, prompt: &str, options: &'o [String]) -> DashboardResult<&'o str> {
        for (i, option) in options.iter().enumerate() {
            self.say(format!("  {}. {}", i + 1, option))?;
        }
        loop {
            let answer = self.ask_required(&format!("{}: ", prompt))?;
            if let Ok(n) = answer.parse::<usize>() {
                if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
                    return Ok(option.as_str());
                }
            }
            if let Some(option) = options.iter().find(|o| o.eq_ignore_ascii_case(&answer)) {
                return Ok(option.as_str());
            }
            self.say(format!("Invalid choice '{}'. Try again.", answer))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::console;

    #[test]
    fn test_eof_is_input_closed() {
        let (mut console, _) = console("");
        assert_eq!(console.read_line("> ").unwrap(), None);
        assert!(console.ask("> ").unwrap_err().is_input_closed());
    }

    #[test]
    fn test_money_reprompts() {
        let (mut console, out) = console("abc\n-450.00\n");
        assert_eq!(console.ask_money("Amount").unwrap(), Money::from_cents(-45_000));
        assert!(out.text().contains("Try again"));
    }

    #[test]
    fn test_period_default() {
        let (mut console, _) = console("\n2024-11\n");
        let default = Period::month(2025, 1);
        assert_eq!(console.ask_period("Period", default).unwrap(), default);
        assert_eq!(console.ask_period("Period", default).unwrap(), Period::month(2024, 11));
    }

    #[test]
    fn test_choose_by_number_or_name() {
        let options = vec!["generic".to_string(), "fnb".to_string()];
        let (mut console, _) = console("7\n2\nGENERIC\n");
        assert_eq!(console.choose("Profile", &options).unwrap(), "fnb");
        assert_eq!(console.choose("Profile", &options).unwrap(), "generic");
    }

    #[test]
    fn test_parsed_with_default() {
        let (mut console, _) = console("\nx\n12\n");
        assert_eq!(console.ask_parsed("Months", Some(6usize)).unwrap(), 6);
        assert_eq!(console.ask_parsed::<usize>("Months", None).unwrap(), 12);
    }
}
