use crate::database::models::{BudgetLimits, Category, Month, NewUser};
use crate::error::{LedgerError, Result};
use crate::parser::InputParser;

pub const HELP_TEXT: &str = "Campus Wallet commands:
/register <username> <student_id> <contact_number> <pin> <full name>
/login <username>          sign in
/logout                    sign out
/whoami                    show the signed-in profile
/balance                   show the wallet balance
/topup <amount> [reference]
/pay <amount> <pin> <destination> [-- description]
/history [category] [--limit N] [--json]
/spending [YYYY-MM]        spending by category
/budget [YYYY-MM]          budget progress
/setbudget canteen=500 library=100 lab=200 club=50 other=100
/home                      home summary
/notifications [--unread]
/read <id|all>             mark notifications as read
/clear                     delete all notifications
/quit";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Register(NewUser),
    Login { username: String },
    Logout,
    WhoAmI,
    Balance,
    TopUp {
        amount: f64,
        external_ref: Option<String>,
    },
    Pay {
        amount: f64,
        pin: String,
        destination: String,
        description: String,
    },
    History {
        category: Option<Category>,
        limit: Option<usize>,
        json: bool,
    },
    Spending { month: Option<Month> },
    Budget { month: Option<Month> },
    SetBudget(BudgetLimits),
    Home,
    Notifications { unread_only: bool },
    Read { notification_id: Option<i64> },
    Clear,
}

impl Command {
    /// Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str, parser: &InputParser) -> Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_lowercase().as_str() {
            "/help" | "/start" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            "/register" => {
                let [username, student_id, contact_number, pin, full_name @ ..] = args.as_slice()
                else {
                    return Err(usage("/register <username> <student_id> <contact_number> <pin> <full name>"));
                };
                if full_name.is_empty() {
                    return Err(usage("/register <username> <student_id> <contact_number> <pin> <full name>"));
                }
                Command::Register(NewUser {
                    username: username.to_string(),
                    full_name: full_name.join(" "),
                    student_id: student_id.to_string(),
                    contact_number: contact_number.to_string(),
                    pin: pin.to_string(),
                })
            }
            "/login" => match args.as_slice() {
                [username] => Command::Login {
                    username: username.to_string(),
                },
                _ => return Err(usage("/login <username>")),
            },
            "/logout" => Command::Logout,
            "/whoami" => Command::WhoAmI,
            "/balance" => Command::Balance,
            "/topup" => match args.as_slice() {
                [amount] => Command::TopUp {
                    amount: parser.parse_amount(amount)?,
                    external_ref: None,
                },
                [amount, reference] => Command::TopUp {
                    amount: parser.parse_amount(amount)?,
                    external_ref: Some(reference.to_string()),
                },
                _ => return Err(usage("/topup <amount> [reference]")),
            },
            "/pay" => parse_pay(&args, parser)?,
            "/history" => parse_history(&args)?,
            "/spending" => Command::Spending {
                month: optional_month(&args, parser, "/spending [YYYY-MM]")?,
            },
            "/budget" => Command::Budget {
                month: optional_month(&args, parser, "/budget [YYYY-MM]")?,
            },
            "/setbudget" => Command::SetBudget(parser.parse_budget_limits(args.iter().copied())?),
            "/home" => Command::Home,
            "/notifications" => match args.as_slice() {
                [] => Command::Notifications { unread_only: false },
                ["--unread"] => Command::Notifications { unread_only: true },
                _ => return Err(usage("/notifications [--unread]")),
            },
            "/read" => match args.as_slice() {
                ["all"] => Command::Read {
                    notification_id: None,
                },
                [id] => Command::Read {
                    notification_id: Some(
                        id.parse()
                            .map_err(|_| LedgerError::invalid_input(format!("'{id}' is not a notification id")))?,
                    ),
                },
                _ => return Err(usage("/read <id|all>")),
            },
            "/clear" => Command::Clear,
            other => {
                return Err(LedgerError::invalid_input(format!(
                    "unknown command '{other}', type /help"
                )))
            }
        };

        Ok(Some(command))
    }
}

fn usage(text: &str) -> LedgerError {
    LedgerError::invalid_input(format!("usage: {text}"))
}

fn parse_pay(args: &[&str], parser: &InputParser) -> Result<Command> {
    const USAGE: &str = "/pay <amount> <pin> <destination> [-- description]";

    let [amount, pin, rest @ ..] = args else {
        return Err(usage(USAGE));
    };
    let split = rest.iter().position(|word| *word == "--").unwrap_or(rest.len());
    let (destination, description) = rest.split_at(split);
    if destination.is_empty() {
        return Err(usage(USAGE));
    }
    let description = description.get(1..).unwrap_or_default().join(" ");

    Ok(Command::Pay {
        amount: parser.parse_amount(amount)?,
        pin: pin.to_string(),
        destination: destination.join(" "),
        description,
    })
}

fn parse_history(args: &[&str]) -> Result<Command> {
    const USAGE: &str = "/history [category] [--limit N] [--json]";

    let mut category = None;
    let mut limit = None;
    let mut json = false;
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        match *arg {
            "--json" => json = true,
            "--limit" => {
                let value = args.next().ok_or_else(|| usage(USAGE))?;
                limit = Some(value.parse::<usize>().map_err(|_| usage(USAGE))?);
            }
            text if category.is_none() => category = Some(text.parse::<Category>()?),
            _ => return Err(usage(USAGE)),
        }
    }

    Ok(Command::History {
        category,
        limit,
        json,
    })
}

fn optional_month(args: &[&str], parser: &InputParser, usage_text: &str) -> Result<Option<Month>> {
    match args {
        [] => Ok(None),
        [month] => parser.parse_month(month).map(Some),
        _ => Err(usage(usage_text)),
    }
}
