//! Reader for the line-oriented `.sconf` configuration grammar
//!
//! ```text
//! =
//! {name -> site}
//! {url -> http://x.test/}
//! +
//! {max-depth -> 1}
//! {versionning -> on}
//! {type -> (text/html, image/png)}
//!
//! ==
//! {name -> nightly}
//! {hour -> 1}
//! +
//! (site)
//! ```
//!
//! `=` opens an action, `==` opens a task, `+` opens the option block of an
//! action or precedes the action list of a task. Crawler and output settings
//! are not expressible in this grammar and keep their defaults.

use crate::config::types::{Action, ActionOption, Config, Task};
use crate::ConfigError;

/// A block under construction
enum Block {
    None,
    Action {
        line: usize,
        name: Option<String>,
        url: Option<String>,
        options: Vec<ActionOption>,
        in_options: bool,
    },
    Task {
        line: usize,
        name: Option<String>,
        hour: i64,
        minute: i64,
        second: i64,
        actions: Option<Vec<String>>,
        expecting_list: bool,
    },
}

/// Parses `.sconf` text into a configuration (not yet validated)
pub fn parse_sconf(content: &str) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let mut block = Block::None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        match line {
            "==" => {
                flush(std::mem::replace(&mut block, Block::None), &mut config)?;
                block = Block::Task {
                    line: line_no,
                    name: None,
                    hour: 0,
                    minute: 0,
                    second: 0,
                    actions: None,
                    expecting_list: false,
                };
                continue;
            }
            "=" => {
                flush(std::mem::replace(&mut block, Block::None), &mut config)?;
                block = Block::Action {
                    line: line_no,
                    name: None,
                    url: None,
                    options: Vec::new(),
                    in_options: false,
                };
                continue;
            }
            _ => {}
        }

        match &mut block {
            Block::None => {
                return Err(syntax(line_no, "content outside of an action or task"));
            }

            Block::Action {
                name,
                url,
                options,
                in_options,
                ..
            } => {
                if line == "+" {
                    *in_options = true;
                    continue;
                }

                let (key, value) = key_value(line, line_no)?;
                if *in_options {
                    options.push(parse_option(key, value, line_no)?);
                } else {
                    match key {
                        "name" => *name = Some(value.to_string()),
                        "url" => *url = Some(value.to_string()),
                        _ => {
                            return Err(syntax(
                                line_no,
                                &format!("undefined field of an action: {{{} -> {}}}", key, value),
                            ))
                        }
                    }
                }
            }

            Block::Task {
                name,
                hour,
                minute,
                second,
                actions,
                expecting_list,
                ..
            } => {
                if line == "+" {
                    *expecting_list = true;
                    continue;
                }

                if *expecting_list {
                    *actions = Some(split_list(line));
                    *expecting_list = false;
                    continue;
                }

                let (key, value) = key_value(line, line_no)?;
                match key {
                    "name" => *name = Some(value.to_string()),
                    "hour" => *hour = parse_int(value, line_no)?,
                    "minute" => *minute = parse_int(value, line_no)?,
                    "second" => *second = parse_int(value, line_no)?,
                    _ => {
                        return Err(syntax(
                            line_no,
                            &format!("undefined field of a task: {{{} -> {}}}", key, value),
                        ))
                    }
                }
            }
        }
    }

    flush(block, &mut config)?;
    Ok(config)
}

/// Moves a finished block into the configuration
fn flush(block: Block, config: &mut Config) -> Result<(), ConfigError> {
    match block {
        Block::None => Ok(()),

        Block::Action {
            line,
            name,
            url,
            options,
            ..
        } => {
            let name = name.ok_or_else(|| syntax(line, "action has no name"))?;
            let url = url.ok_or_else(|| syntax(line, "action has no url"))?;
            config.actions.push(Action { name, url, options });
            Ok(())
        }

        Block::Task {
            line,
            name,
            hour,
            minute,
            second,
            actions,
            ..
        } => {
            let name = name.ok_or_else(|| syntax(line, "task has no name"))?;
            let actions = actions.ok_or_else(|| syntax(line, "task has no action list"))?;
            config.tasks.push(Task {
                name,
                hour,
                minute,
                second,
                actions,
            });
            Ok(())
        }
    }
}

fn parse_option(key: &str, value: &str, line: usize) -> Result<ActionOption, ConfigError> {
    match key {
        "max-depth" => value
            .parse::<u32>()
            .map(ActionOption::MaxDepth)
            .map_err(|_| {
                syntax(
                    line,
                    &format!("max-depth must be a non-negative integer, got '{}'", value),
                )
            }),
        "versionning" | "versioning" => Ok(ActionOption::Versioning(value == "on")),
        "type" => Ok(ActionOption::TypeSelect(split_list(value).into_iter().collect())),
        _ => Err(syntax(
            line,
            &format!("undefined option of an action: {{{} -> {}}}", key, value),
        )),
    }
}

/// Splits `{key -> value}` into its trimmed parts
fn key_value(line: &str, line_no: usize) -> Result<(&str, &str), ConfigError> {
    line.strip_prefix('{')
        .and_then(|l| l.strip_suffix('}'))
        .and_then(|inner| inner.split_once("->"))
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| syntax(line_no, &format!("expected '{{key -> value}}', got '{}'", line)))
}

/// Splits `(a, b, c)` into its non-empty elements
fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == '(' || c == ')')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_int(value: &str, line: usize) -> Result<i64, ConfigError> {
    value
        .parse::<i64>()
        .map_err(|_| syntax(line, &format!("expected an integer, got '{}'", value)))
}

fn syntax(line: usize, message: &str) -> ConfigError {
    ConfigError::Syntax {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "=
{name -> site}
{url -> http://x.test/?a=b}
+
{max-depth -> 2}
{versionning -> on}
{type -> (text/html, image/png)}

=
{name -> other}
{url -> https://other.test/}

==
{name -> nightly}
{hour -> 1}
{second -> 90}
+
(site, other)
";

    #[test]
    fn test_parse_actions_and_tasks() {
        let config = parse_sconf(SAMPLE).unwrap();

        assert_eq!(config.actions.len(), 2);
        let site = &config.actions[0];
        assert_eq!(site.name, "site");
        assert_eq!(site.url, "http://x.test/?a=b");
        assert_eq!(site.max_depth(), 2);
        assert!(site.versioning());
        assert!(site.is_selected("image/png"));
        assert!(!site.is_selected("application/pdf"));

        let other = &config.actions[1];
        assert_eq!(other.max_depth(), 0);
        assert!(other.options.is_empty());

        assert_eq!(config.tasks.len(), 1);
        let task = &config.tasks[0];
        assert_eq!(task.name, "nightly");
        assert_eq!(task.actions, vec!["site", "other"]);
        let time = task.launch_time();
        assert_eq!((time.hour, time.minute, time.second), (1, 1, 30));
    }

    #[test]
    fn test_undefined_action_field() {
        let err = parse_sconf("=\n{name -> a}\n{colour -> red}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_undefined_option() {
        let err = parse_sconf("=\n{name -> a}\n{url -> http://a.test}\n+\n{speed -> 3}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 5, .. }));
    }

    #[test]
    fn test_bad_depth() {
        let err = parse_sconf("=\n{name -> a}\n{url -> http://a.test}\n+\n{max-depth -> -1}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_action_without_url() {
        let err = parse_sconf("=\n{name -> a}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_task_without_list() {
        let err = parse_sconf("==\n{name -> t}\n{hour -> 2}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_content_outside_block() {
        let err = parse_sconf("{name -> stray}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("(a, b ,c)"), vec!["a", "b", "c"]);
        assert_eq!(split_list("( )"), Vec::<String>::new());
        assert_eq!(split_list("single"), vec!["single"]);
    }
}
