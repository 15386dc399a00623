pub const CURRENT_CHANCE: &str = "CURRENT_CHANCE";
pub const NEXT_CHANCE: &str = "NEXT_CHANCE";

pub const DEFAULT_SHOW_CHANCE_MESSAGE: &str = "Current chance is CURRENT_CHANCE%";
pub const DEFAULT_SET_CHANCE_MESSAGE: &str =
    "Current chance changed from CURRENT_CHANCE% to NEXT_CHANCE%";

/// Reply templates, see [`format`] for the placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub show_chance: String,
    pub set_chance: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            show_chance: DEFAULT_SHOW_CHANCE_MESSAGE.to_owned(),
            set_chance: DEFAULT_SET_CHANCE_MESSAGE.to_owned(),
        }
    }
}

/// Fills in the `CURRENT_CHANCE` and `NEXT_CHANCE` placeholders.
///
/// A placeholder whose value is `None` is left as it is.
pub fn format(template: &str, current_chance: Option<i64>, next_chance: Option<i64>) -> String {
    let mut result = template.to_owned();

    if let Some(current) = current_chance {
        result = result.replace(CURRENT_CHANCE, &current.to_string());
    }
    if let Some(next) = next_chance {
        result = result.replace(NEXT_CHANCE, &next.to_string());
    }

    result
}

pub fn invalid_chance() -> String {
    "The chance must be a number between 0 and 100.".to_owned()
}

pub fn internal_error() -> String {
    "Sorry, an internal error occurred :((".to_owned()
}

pub const HELP_MESSAGE: &str = "
Supported commands:
/help
/chance
/set_chance <0-100>

Every message in this chat is answered with the given chance in percent. \
A chance of 0 switches replies off.";
