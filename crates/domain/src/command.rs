//! The one-line routine command language.
//!
//! ```text
//! <trigger> [if <cond> (and <cond>)*] do <action> (then <action>)*
//!
//! trigger  := "timer" <duration> | "on" ("join" | "leave" | "move")
//! cond     := ("user" | "channel" | "role" | "time" | "date") ("=" | "!=") <value>
//! action   := "play" <sound name> ["in" <voice channel id>]
//!           | "wait" <duration>
//!           | ("msg" | "message") <channel id> <text>
//! duration := <n>["s" | "m" | "h"]
//! ```
//!
//! For example `on join if role=42 and time=18:00-23:00 do play hello then
//! wait 2s then msg 99 welcome {user}`.

use crate::error::{CommandError, SoundboardError};
use crate::id::{ChannelId, GuildId, RoleId, UserId};
use crate::routine::{Action, Atom, AtomTable, Condition, ConditionExpr, Routine, Trigger};
use crate::voice::VoiceEventKind;

/// The parts of a routine described by a command, before it gets a name
/// and a guild.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDraft {
    pub trigger: Trigger,
    pub condition: Option<Condition>,
    pub actions: Vec<Action>,
}

impl RoutineDraft {
    /// Attach a guild and a name, yielding an enabled routine.
    ///
    /// # Errors
    ///
    /// Returns [`SoundboardError::Validation`] if the resulting routine is
    /// invalid (e.g. a blank name).
    pub fn into_routine(
        self,
        guild_id: GuildId,
        name: impl Into<String>,
    ) -> Result<Routine, SoundboardError> {
        Routine::builder()
            .guild_id(guild_id)
            .name(name)
            .trigger(self.trigger)
            .maybe_condition(self.condition)
            .actions(self.actions)
            .build()
    }
}

/// Parse a routine command.
///
/// Several conditions are combined with AND; `!=` negates one.
///
/// # Errors
///
/// Returns a [`CommandError`] naming the fragment that could not be read.
pub fn parse_command(text: &str) -> Result<RoutineDraft, CommandError> {
    let (head, body) = text.split_once(" do ").ok_or(CommandError::MissingDo)?;
    let (trigger, conditions) = match head.split_once(" if ") {
        Some((trigger, conditions)) => (trigger, Some(conditions)),
        None => (head, None),
    };
    Ok(RoutineDraft {
        trigger: parse_trigger(trigger)?,
        condition: conditions.map(parse_conditions).transpose()?,
        actions: body
            .split(" then ")
            .map(parse_action)
            .collect::<Result<_, _>>()?,
    })
}

fn parse_trigger(text: &str) -> Result<Trigger, CommandError> {
    let mut words = text.split_whitespace();
    let keyword = words.next().ok_or(CommandError::EmptyTrigger)?;
    match keyword.to_ascii_lowercase().as_str() {
        "timer" => {
            let raw = words
                .next()
                .ok_or_else(|| CommandError::InvalidDuration(String::new()))?;
            let secs = parse_duration(raw)?;
            if secs.fract() != 0.0 {
                return Err(CommandError::InvalidDuration(raw.to_string()));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let secs = secs as u64;
            Ok(Trigger::timer(secs)?)
        }
        "on" => {
            let event = words
                .next()
                .ok_or_else(|| CommandError::UnknownEvent(String::new()))?;
            Ok(Trigger::event(event.parse::<VoiceEventKind>()?))
        }
        _ => Err(CommandError::UnknownTrigger(keyword.to_string())),
    }
}

/// `30s`, `5m`, `1h` or a bare number of seconds.
fn parse_duration(raw: &str) -> Result<f64, CommandError> {
    let invalid = || CommandError::InvalidDuration(raw.to_string());
    let lower = raw.trim().to_ascii_lowercase();
    let (number, unit) = match lower.char_indices().last() {
        Some((i, 's')) => (&lower[..i], 1.0),
        Some((i, 'm')) => (&lower[..i], 60.0),
        Some((i, 'h')) => (&lower[..i], 3600.0),
        Some(_) => (lower.as_str(), 1.0),
        None => return Err(invalid()),
    };
    let value: f64 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value * unit)
}

fn parse_conditions(text: &str) -> Result<Condition, CommandError> {
    let mut atoms = AtomTable::new();
    let mut terms = Vec::new();
    for part in text.split(" and ") {
        let part = part.trim();
        let (key, value, negated) = if let Some((key, value)) = part.split_once("!=") {
            (key, value, true)
        } else if let Some((key, value)) = part.split_once('=') {
            (key, value, false)
        } else {
            return Err(CommandError::InvalidCondition(part.to_string()));
        };
        let atom = parse_atom(key.trim(), value.trim())?;
        let term = ConditionExpr::atom(atoms.push(atom));
        terms.push(if negated { ConditionExpr::not(term) } else { term });
    }
    Ok(Condition::new(atoms, ConditionExpr::and(terms))?)
}

fn parse_atom(key: &str, value: &str) -> Result<Atom, CommandError> {
    let atom = match key.to_ascii_lowercase().as_str() {
        "user" => Atom::User {
            id: UserId::new(strip_mention(value, &["<@!", "<@"]))?,
        },
        "channel" => Atom::Channel {
            id: ChannelId::new(strip_mention(value, &["<#", "#"]))?,
        },
        "role" => Atom::Role {
            id: RoleId::new(strip_mention(value, &["<@&"]))?,
        },
        "time" => Atom::Time {
            range: value.parse()?,
        },
        "date" => Atom::Date {
            range: value.parse()?,
        },
        _ => return Err(CommandError::UnknownConditionKey(key.to_string())),
    };
    Ok(atom)
}

/// Accept `<@123>`, `<#123>`, `#123` and friends as well as a bare id.
fn strip_mention<'a>(value: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
        .map_or(value, |rest| rest.strip_suffix('>').unwrap_or(rest))
}

fn parse_action(text: &str) -> Result<Action, CommandError> {
    let text = text.trim();
    let (verb, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let args = args.trim();
    let missing = || CommandError::MissingArgument {
        verb: verb.to_string(),
    };
    let action = match verb.to_ascii_lowercase().as_str() {
        "play" if args.is_empty() => return Err(missing()),
        "play" => match args.rsplit_once(" in ") {
            Some((sound, channel)) => Action::play_in(
                sound.trim(),
                ChannelId::new(strip_mention(channel.trim(), &["<#", "#"]))?,
            ),
            None => Action::play(args),
        },
        "wait" if args.is_empty() => return Err(missing()),
        "wait" => Action::wait(parse_duration(args)?),
        "msg" | "message" => {
            let (channel, message) = args.split_once(char::is_whitespace).ok_or_else(missing)?;
            Action::message(
                ChannelId::new(strip_mention(channel, &["<#", "#"]))?,
                message.trim(),
            )
        }
        _ => return Err(CommandError::UnknownAction(verb.to_string())),
    };
    action.validate()?;
    Ok(action)
}
