//! External feed tree and the spreadsheet row layout it is read from.
//!
//! A worksheet row is classified by its first populated id column:
//!
//! | column | A (0) | B (1) | C (2) | D (3) | E (4) | F (5) | G (6) |
//! |---|---|---|---|---|---|---|---|
//! | menu | id | title | description | | | | |
//! | submenu | | id | title | description | | | |
//! | dish | | | id | title | description | price | discount |
//!
//! Submenu and dish rows attach to the closest header above them. Rows before the
//! first menu header are ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::pricing::{format_price, stored_price};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub menus: Vec<FeedMenu>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMenu {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submenus: Vec<FeedSubmenu>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSubmenu {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dishes: Vec<FeedDish>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDish {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: String,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl FeedDish {
    pub fn stored_price(&self) -> Result<String, DomainError> {
        stored_price(&self.price, self.discount)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Text(String),
    Number(f64),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match PriceInput::deserialize(deserializer)? {
        PriceInput::Text(text) => text,
        PriceInput::Number(value) => format_price(value),
    })
}

/// A single worksheet cell, reduced to what the row layout cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: FeedCell = FeedCell::Empty;

impl FeedCell {
    fn as_id(&self) -> Option<String> {
        match self {
            FeedCell::Empty => None,
            FeedCell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            FeedCell::Number(value) => Some(integral_or_plain(*value)),
        }
    }

    fn text(&self) -> String {
        self.as_id().unwrap_or_default()
    }

    fn as_price(&self) -> Option<String> {
        match self {
            FeedCell::Number(value) => Some(format_price(*value)),
            other => other.as_id(),
        }
    }

    fn as_discount(&self) -> Result<Option<f64>, String> {
        match self {
            FeedCell::Empty => Ok(None),
            FeedCell::Number(value) => Ok(Some(*value)),
            FeedCell::Text(text) if text.trim().is_empty() => Ok(None),
            FeedCell::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("discount `{}` is not a number", text.trim())),
        }
    }
}

fn integral_or_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn cell_at(cells: &[FeedCell], index: usize) -> &FeedCell {
    cells.get(index).unwrap_or(&EMPTY_CELL)
}

impl FeedSnapshot {
    /// Build the tree from worksheet rows, top to bottom. Row numbers in errors are 1-based.
    pub fn from_rows<I, R>(rows: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[FeedCell]>,
    {
        let mut menus: Vec<FeedMenu> = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let cells = row.as_ref();

            if let Some(id) = cell_at(cells, 0).as_id() {
                menus.push(FeedMenu {
                    id,
                    title: cell_at(cells, 1).text(),
                    description: cell_at(cells, 2).text(),
                    submenus: Vec::new(),
                });
                continue;
            }

            let Some(menu) = menus.last_mut() else {
                continue;
            };

            if let Some(id) = cell_at(cells, 1).as_id() {
                menu.submenus.push(FeedSubmenu {
                    id,
                    title: cell_at(cells, 2).text(),
                    description: cell_at(cells, 3).text(),
                    dishes: Vec::new(),
                });
                continue;
            }

            let Some(id) = cell_at(cells, 2).as_id() else {
                continue;
            };
            let Some(submenu) = menu.submenus.last_mut() else {
                return Err(DomainError::malformed_row(
                    row_number,
                    format!("dish `{id}` appears before any submenu"),
                ));
            };
            let price = cell_at(cells, 5).as_price().ok_or_else(|| {
                DomainError::malformed_row(row_number, format!("dish `{id}` has no price"))
            })?;
            let discount = cell_at(cells, 6)
                .as_discount()
                .map_err(|message| DomainError::malformed_row(row_number, message))?;

            submenu.dishes.push(FeedDish {
                id,
                title: cell_at(cells, 3).text(),
                description: cell_at(cells, 4).text(),
                price,
                discount,
            });
        }

        Ok(Self { menus })
    }

    /// Reject snapshots that cannot be reconciled: blank ids or titles, ids repeated
    /// within a level, and prices or discounts outside the price rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut menu_ids = HashSet::new();
        let mut submenu_ids = HashSet::new();
        let mut dish_ids = HashSet::new();

        for menu in &self.menus {
            ensure_present("menu", &menu.id, &menu.title)?;
            if !menu_ids.insert(menu.id.as_str()) {
                return Err(DomainError::duplicate_id("menu", &menu.id));
            }

            for submenu in &menu.submenus {
                ensure_present("submenu", &submenu.id, &submenu.title)?;
                if !submenu_ids.insert(submenu.id.as_str()) {
                    return Err(DomainError::duplicate_id("submenu", &submenu.id));
                }

                for dish in &submenu.dishes {
                    ensure_present("dish", &dish.id, &dish.title)?;
                    if !dish_ids.insert(dish.id.as_str()) {
                        return Err(DomainError::duplicate_id("dish", &dish.id));
                    }
                    dish.stored_price().map_err(|err| {
                        DomainError::validation(format!("dish `{}`: {err}", dish.id))
                    })?;
                }
            }
        }

        Ok(())
    }

    pub fn dish_count(&self) -> usize {
        self.menus
            .iter()
            .flat_map(|menu| menu.submenus.iter())
            .map(|submenu| submenu.dishes.len())
            .sum()
    }
}

fn ensure_present(level: &'static str, id: &str, title: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::validation(format!("{level} id must not be empty")));
    }
    if title.trim().is_empty() {
        return Err(DomainError::validation(format!(
            "{level} `{id}` has an empty title"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FeedCell {
        FeedCell::Text(value.to_string())
    }

    fn row(cells: &[FeedCell]) -> Vec<FeedCell> {
        cells.to_vec()
    }

    #[test]
    fn rows_are_classified_by_first_populated_column() {
        use FeedCell::{Empty, Number};

        let rows = vec![
            row(&[Number(1.0), text("Lunch"), text("Weekday lunch")]),
            row(&[Empty, Number(11.0), text("Soups"), text("Hot")]),
            row(&[
                Empty,
                Empty,
                text("d1"),
                text("Borscht"),
                text("Beet soup"),
                Number(10.0),
                Number(0.1),
            ]),
            row(&[
                Empty,
                Empty,
                text("d2"),
                text("Ramen"),
                Empty,
                text("12.50"),
            ]),
            row(&[Empty, text("s2"), text("Salads"), Empty]),
            row(&[text("m2"), text("Dinner")]),
        ];

        let snapshot = FeedSnapshot::from_rows(rows).expect("rows parse");

        assert_eq!(snapshot.menus.len(), 2);
        let lunch = &snapshot.menus[0];
        assert_eq!(lunch.id, "1");
        assert_eq!(lunch.submenus.len(), 2);
        assert_eq!(lunch.submenus[0].id, "11");
        assert_eq!(lunch.submenus[0].dishes.len(), 2);

        let borscht = &lunch.submenus[0].dishes[0];
        assert_eq!(borscht.price, "10.0");
        assert_eq!(borscht.discount, Some(0.1));
        assert_eq!(borscht.stored_price().unwrap(), "9.0");

        let ramen = &lunch.submenus[0].dishes[1];
        assert_eq!(ramen.price, "12.50");
        assert_eq!(ramen.discount, None);
        assert_eq!(ramen.description, "");

        assert!(lunch.submenus[1].dishes.is_empty());
        assert!(snapshot.menus[1].submenus.is_empty());
        assert_eq!(snapshot.dish_count(), 2);
    }

    #[test]
    fn rows_before_first_menu_are_skipped() {
        let rows = vec![
            row(&[FeedCell::Empty, text("orphan"), text("Orphan")]),
            row(&[text("m1"), text("Menu")]),
        ];
        let snapshot = FeedSnapshot::from_rows(rows).expect("rows parse");
        assert_eq!(snapshot.menus.len(), 1);
        assert!(snapshot.menus[0].submenus.is_empty());
    }

    #[test]
    fn dish_without_submenu_is_malformed() {
        let rows = vec![
            row(&[text("m1"), text("Menu")]),
            row(&[
                FeedCell::Empty,
                FeedCell::Empty,
                text("d1"),
                text("Dish"),
                FeedCell::Empty,
                text("5"),
            ]),
        ];
        let err = FeedSnapshot::from_rows(rows).expect_err("dish needs a submenu");
        assert!(matches!(err, DomainError::MalformedRow { row: 2, .. }));
    }

    #[test]
    fn dish_without_price_is_malformed() {
        let rows = vec![
            row(&[text("m1"), text("Menu")]),
            row(&[FeedCell::Empty, text("s1"), text("Sub")]),
            row(&[FeedCell::Empty, FeedCell::Empty, text("d1"), text("Dish")]),
        ];
        let err = FeedSnapshot::from_rows(rows).expect_err("price is required");
        assert!(matches!(err, DomainError::MalformedRow { row: 3, .. }));
    }

    fn snapshot_json(json: &str) -> FeedSnapshot {
        serde_json::from_str(json).expect("snapshot json")
    }

    #[test]
    fn duplicate_ids_across_the_feed_are_rejected() {
        let snapshot = snapshot_json(
            r#"{"menus": [
                {"id": "m1", "title": "A", "submenus": [{"id": "s1", "title": "S"}]},
                {"id": "m2", "title": "B", "submenus": [{"id": "s1", "title": "S again"}]}
            ]}"#,
        );
        let err = snapshot.validate().expect_err("duplicate submenu id");
        assert!(matches!(
            err,
            DomainError::DuplicateId { level: "submenu", .. }
        ));
    }

    #[test]
    fn empty_titles_and_bad_prices_are_rejected() {
        let blank_title = snapshot_json(r#"{"menus": [{"id": "m1", "title": "  "}]}"#);
        assert!(blank_title.validate().is_err());

        let bad_price = snapshot_json(
            r#"{"menus": [{"id": "m1", "title": "A", "submenus": [
                {"id": "s1", "title": "S", "dishes": [
                    {"id": "d1", "title": "D", "price": "abc"}
                ]}
            ]}]}"#,
        );
        assert!(bad_price.validate().is_err());
    }

    #[test]
    fn json_prices_accept_numbers_and_strings() {
        let snapshot = snapshot_json(
            r#"{"menus": [{"id": "m1", "title": "A", "submenus": [
                {"id": "s1", "title": "S", "dishes": [
                    {"id": "d1", "title": "D", "price": 10, "discount": 0.1},
                    {"id": "d2", "title": "E", "price": "7.25"}
                ]}
            ]}]}"#,
        );
        snapshot.validate().expect("valid snapshot");
        let dishes = &snapshot.menus[0].submenus[0].dishes;
        assert_eq!(dishes[0].price, "10.0");
        assert_eq!(dishes[0].stored_price().unwrap(), "9.0");
        assert_eq!(dishes[1].stored_price().unwrap(), "7.25");
    }
}
