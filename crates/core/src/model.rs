use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Wire format used when a due date is sent back to the server.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Colors a list may carry.
pub const LIST_COLORS: [&str; 5] = ["blue", "green", "yellow", "orange", "gray"];

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| anyhow!("Invalid id '{}': expected an integer", s))
            }
        }
    };
}

numeric_id!(UserId);
numeric_id!(TaskId);
numeric_id!(ListId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "Doing")]
    Doing,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::Doing, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
        }
    }

    pub fn cli_name(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "to do" | "todo" | "to-do" => Ok(TaskStatus::ToDo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            other => Err(anyhow!(
                "Unknown status '{}': expected todo|doing|done",
                other
            )),
        }
    }
}

impl ValueEnum for TaskStatus {
    fn value_variants<'a>() -> &'a [Self] {
        &TaskStatus::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        let value = clap::builder::PossibleValue::new(self.cli_name());
        Some(match self {
            TaskStatus::ToDo => value.alias("to-do"),
            _ => value,
        })
    }
}

/// Due-date window applied by the board filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    #[default]
    All,
    Today,
    ThreeDays,
    Week,
    TwoWeeks,
    Month,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::All,
        TimeWindow::Today,
        TimeWindow::ThreeDays,
        TimeWindow::Week,
        TimeWindow::TwoWeeks,
        TimeWindow::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "All",
            TimeWindow::Today => "Today",
            TimeWindow::ThreeDays => "3",
            TimeWindow::Week => "7",
            TimeWindow::TwoWeeks => "14",
            TimeWindow::Month => "30",
        }
    }

    /// Length of a day-count window. `None` for the `All` and `Today` sentinels.
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeWindow::All | TimeWindow::Today => None,
            TimeWindow::ThreeDays => Some(3),
            TimeWindow::Week => Some(7),
            TimeWindow::TwoWeeks => Some(14),
            TimeWindow::Month => Some(30),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimeWindow::All),
            "today" => Ok(TimeWindow::Today),
            "3" => Ok(TimeWindow::ThreeDays),
            "7" => Ok(TimeWindow::Week),
            "14" => Ok(TimeWindow::TwoWeeks),
            "30" => Ok(TimeWindow::Month),
            other => Err(anyhow!(
                "Unknown time window '{}': expected all|today|3|7|14|30",
                other
            )),
        }
    }
}

impl ValueEnum for TimeWindow {
    fn value_variants<'a>() -> &'a [Self] {
        &TimeWindow::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        let name = match self {
            TimeWindow::All => "all",
            TimeWindow::Today => "today",
            other => other.as_str(),
        };
        Some(clap::builder::PossibleValue::new(name))
    }
}

/// Background theme, persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Gray,
    Green,
    Purple,
    Blue,
    Orange,
    Yellow,
    Pink,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::Gray,
        Theme::Green,
        Theme::Purple,
        Theme::Blue,
        Theme::Orange,
        Theme::Yellow,
        Theme::Pink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Gray => "gray",
            Theme::Green => "green",
            Theme::Purple => "purple",
            Theme::Blue => "blue",
            Theme::Orange => "orange",
            Theme::Yellow => "yellow",
            Theme::Pink => "pink",
        }
    }

    /// Style class a presentation layer applies for this theme.
    pub fn style_class(&self) -> &'static str {
        match self {
            Theme::Gray => "bg-gray",
            Theme::Green => "bg-teal-100",
            Theme::Purple => "bg-indigo-100",
            Theme::Blue => "bg-blue-100",
            Theme::Orange => "bg-orange-100",
            Theme::Yellow => "bg-yellow-100",
            Theme::Pink => "bg-pink-100",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == needle)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown theme '{}': expected gray|green|purple|blue|orange|yellow|pink",
                    needle
                )
            })
    }
}

impl ValueEnum for Theme {
    fn value_variants<'a>() -> &'a [Self] {
        &Theme::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Member of the list-membership filter. `Unlisted` selects tasks without a list
/// and is the `-1` sentinel in numeric form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListKey {
    Unlisted,
    List(ListId),
}

impl ListKey {
    pub const UNLISTED_RAW: i64 = -1;

    pub fn from_raw(raw: i64) -> Self {
        if raw == Self::UNLISTED_RAW {
            ListKey::Unlisted
        } else {
            ListKey::List(ListId(raw))
        }
    }

    pub fn as_raw(&self) -> i64 {
        match self {
            ListKey::Unlisted => Self::UNLISTED_RAW,
            ListKey::List(id) => id.0,
        }
    }

    pub fn list_id(&self) -> Option<ListId> {
        match self {
            ListKey::Unlisted => None,
            ListKey::List(id) => Some(*id),
        }
    }
}

impl From<Option<ListId>> for ListKey {
    fn from(value: Option<ListId>) -> Self {
        value.map_or(ListKey::Unlisted, ListKey::List)
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKey::Unlisted => write!(f, "none"),
            ListKey::List(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for ListKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "unlisted" => Ok(ListKey::Unlisted),
            other => other
                .parse::<i64>()
                .map(ListKey::from_raw)
                .map_err(|_| anyhow!("Invalid list '{}': expected an id or 'none'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub user_id: UserId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDateTime>,
    pub status: TaskStatus,
    #[serde(default)]
    pub list_id: Option<ListId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_color: Option<String>,
}

impl Task {
    pub fn list_key(&self) -> ListKey {
        ListKey::from(self.list_id)
    }

    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|due| due.date())
    }
}

/// Task body sent on creation; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub user_id: UserId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "due_date_format")]
    pub due_date: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub list_id: Option<ListId>,
}

/// Parse a due date as the server or a user may write it: a bare date, a local
/// date-time without offset, or an RFC 3339 timestamp (converted to local time).
pub fn parse_due_date(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Local).naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(anyhow!(
        "Invalid due date '{}': expected YYYY-MM-DD or an ISO timestamp",
        value
    ))
}

mod due_date_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DUE_DATE_FORMAT;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(due) => serializer.serialize_some(&due.format(DUE_DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_due_date(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn task_deserializes_server_payload() {
        let payload = json!({
            "id": 12,
            "userId": 3,
            "listId": null,
            "title": "Pay rent",
            "description": null,
            "dueDate": "2025-06-12T00:00:00",
            "status": "To Do",
            "listName": null,
            "listColor": "gray"
        });

        let task: Task = serde_json::from_value(payload).unwrap();
        assert_eq!(task.id, TaskId(12));
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.list_key(), ListKey::Unlisted);
        assert_eq!(
            task.due_day(),
            NaiveDate::from_ymd_opt(2025, 6, 12)
        );
        assert_eq!(task.list_color.as_deref(), Some("gray"));
    }

    #[test]
    fn task_serializes_due_date_without_offset() {
        let task = Task {
            id: TaskId(1),
            user_id: UserId(2),
            title: "Ship".into(),
            description: None,
            due_date: Some(parse_due_date("2025-06-10").unwrap()),
            status: TaskStatus::Doing,
            list_id: Some(ListId(4)),
            list_name: None,
            list_color: None,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], json!("2025-06-10T00:00:00"));
        assert_eq!(value["status"], json!("Doing"));
        assert_eq!(value["listId"], json!(4));
        assert!(value.get("listName").is_none());
    }

    #[test]
    fn parse_due_date_accepts_server_and_user_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(parse_due_date("2025-06-12").unwrap().date(), expected);
        assert_eq!(
            parse_due_date("2025-06-12T08:30:00.123").unwrap().date(),
            expected
        );
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn list_key_round_trips_sentinel() {
        assert_eq!(ListKey::from_raw(-1), ListKey::Unlisted);
        assert_eq!(ListKey::from_raw(7), ListKey::List(ListId(7)));
        assert_eq!(ListKey::Unlisted.as_raw(), -1);
        assert_eq!("none".parse::<ListKey>().unwrap(), ListKey::Unlisted);
        assert_eq!("5".parse::<ListKey>().unwrap(), ListKey::List(ListId(5)));
    }

    #[test]
    fn parses_closed_filter_values() {
        assert_eq!("To Do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!("14".parse::<TimeWindow>().unwrap(), TimeWindow::TwoWeeks);
        assert_eq!(TimeWindow::Today.days(), None);
        assert!("5".parse::<TimeWindow>().is_err());
        assert_eq!("Purple".parse::<Theme>().unwrap(), Theme::Purple);
        assert_eq!(Theme::Green.style_class(), "bg-teal-100");
    }
}
