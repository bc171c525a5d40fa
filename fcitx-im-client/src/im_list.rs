use std::{collections::HashSet, ops::Deref};

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::{dbus::entity::ImListEntry, Error, Result};

/// One entry of IMList.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Getters, CopyGetters)]
pub struct InputMethodItem {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    unique_name: String,
    #[getset(get = "pub")]
    lang_code: String,
    #[getset(get_copy = "pub")]
    enable: bool,
}

impl InputMethodItem {
    pub fn new(name: &str, unique_name: &str, lang_code: &str, enable: bool) -> Self {
        Self {
            name: name.to_string(),
            unique_name: unique_name.to_string(),
            lang_code: lang_code.to_string(),
            enable,
        }
    }
}

impl From<ImListEntry> for InputMethodItem {
    fn from((name, unique_name, lang_code, enable): ImListEntry) -> Self {
        Self {
            name,
            unique_name,
            lang_code,
            enable,
        }
    }
}

impl From<InputMethodItem> for ImListEntry {
    fn from(item: InputMethodItem) -> Self {
        let InputMethodItem {
            name,
            unique_name,
            lang_code,
            enable,
        } = item;
        (name, unique_name, lang_code, enable)
    }
}

/// A snapshot of IMList. The order is the priority configured in the daemon.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InputMethodList(Vec<InputMethodItem>);

impl InputMethodList {
    /// Builds a list from items, unique names must not repeat.
    pub fn new(items: Vec<InputMethodItem>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.unique_name.as_str()) {
                return Err(Error::DuplicateInputMethod(item.unique_name.clone()));
            }
        }
        Ok(Self(items))
    }

    pub(crate) fn from_entries(entries: Vec<ImListEntry>) -> Self {
        Self(entries.into_iter().map(InputMethodItem::from).collect())
    }

    pub(crate) fn to_entries(&self) -> Vec<ImListEntry> {
        self.0.iter().cloned().map(ImListEntry::from).collect()
    }

    pub fn get(&self, unique_name: &str) -> Option<&InputMethodItem> {
        self.0.iter().find(|item| item.unique_name == unique_name)
    }

    pub fn position(&self, unique_name: &str) -> Option<usize> {
        self.0.iter().position(|item| item.unique_name == unique_name)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &InputMethodItem> {
        self.0.iter().filter(|item| item.enable)
    }

    /// A copy of this list with the given input method switched on or off, `None` if it is not in
    /// the list.
    pub fn with_enabled(&self, unique_name: &str, enable: bool) -> Option<Self> {
        let index = self.position(unique_name)?;
        let mut items = self.0.clone();
        items[index].enable = enable;
        Some(Self(items))
    }

    /// A copy of this list with the given input method moved to `index`. The index is clamped to
    /// the end of the list. `None` if it is not in the list.
    pub fn moved(&self, unique_name: &str, index: usize) -> Option<Self> {
        let from = self.position(unique_name)?;
        let mut items = self.0.clone();
        let item = items.remove(from);
        let index = index.min(items.len());
        items.insert(index, item);
        Some(Self(items))
    }

    pub fn into_items(self) -> Vec<InputMethodItem> {
        self.0
    }
}

impl Deref for InputMethodList {
    type Target = [InputMethodItem];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a InputMethodList {
    type Item = &'a InputMethodItem;
    type IntoIter = std::slice::Iter<'a, InputMethodItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InputMethodList {
        InputMethodList::new(vec![
            InputMethodItem::new("Keyboard - English", "fcitx-keyboard-us", "en", true),
            InputMethodItem::new("Pinyin", "pinyin", "zh_CN", true),
            InputMethodItem::new("Mozc", "mozc", "ja", false),
        ])
        .unwrap()
    }

    fn unique_names(list: &InputMethodList) -> Vec<&str> {
        list.iter().map(|item| item.unique_name().as_str()).collect()
    }

    #[test]
    fn test_decode_keeps_order() {
        let list = InputMethodList::from_entries(vec![
            ("Mozc".into(), "mozc".into(), "ja".into(), false),
            ("Pinyin".into(), "pinyin".into(), "zh_CN".into(), true),
        ]);
        assert_eq!(unique_names(&list), vec!["mozc", "pinyin"]);
        assert_eq!(list[1].lang_code(), "zh_CN");
        assert!(list[1].enable());
        assert!(!list[0].enable());
    }

    #[test]
    fn test_entries_follow_list_order() {
        let list = sample();
        let entries = list.to_entries();
        assert_eq!(entries[0].1, "fcitx-keyboard-us");
        assert_eq!(
            entries[2],
            ("Mozc".to_string(), "mozc".to_string(), "ja".to_string(), false)
        );
        assert_eq!(InputMethodList::from_entries(entries), list);
    }

    #[test]
    fn test_duplicate_unique_name_is_rejected() {
        let res = InputMethodList::new(vec![
            InputMethodItem::new("Pinyin", "pinyin", "zh_CN", true),
            InputMethodItem::new("Pinyin again", "pinyin", "zh_CN", false),
        ]);
        assert!(matches!(res, Err(Error::DuplicateInputMethod(name)) if name == "pinyin"));
    }

    #[test]
    fn test_with_enabled_returns_new_snapshot() {
        let list = sample();
        let updated = list.with_enabled("mozc", true).unwrap();
        assert!(updated.get("mozc").unwrap().enable());
        assert!(!list.get("mozc").unwrap().enable());
        assert_eq!(unique_names(&updated), unique_names(&list));
        assert!(list.with_enabled("anthy", true).is_none());
    }

    #[test]
    fn test_moved() {
        let list = sample();
        let updated = list.moved("mozc", 0).unwrap();
        assert_eq!(
            unique_names(&updated),
            vec!["mozc", "fcitx-keyboard-us", "pinyin"]
        );
        let updated = list.moved("fcitx-keyboard-us", 10).unwrap();
        assert_eq!(
            unique_names(&updated),
            vec!["pinyin", "mozc", "fcitx-keyboard-us"]
        );
        assert!(list.moved("anthy", 0).is_none());
    }

    #[test]
    fn test_enabled() {
        let list = sample();
        let enabled: Vec<_> = list.enabled().map(|item| item.unique_name().as_str()).collect();
        assert_eq!(enabled, vec!["fcitx-keyboard-us", "pinyin"]);
    }
}
