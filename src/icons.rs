// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use iced::widget::svg;

static ICON_CACHE: OnceLock<Mutex<IconCache>> = OnceLock::new();

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct IconCacheKey {
    name: &'static str,
    size: u16,
}

struct IconCache {
    cache: HashMap<IconCacheKey, svg::Handle>,
}

impl IconCache {
    fn new() -> Self {
        let mut cache = HashMap::new();

        macro_rules! bundle {
            ($name:expr, $size:expr) => {
                let data: &'static [u8] =
                    include_bytes!(concat!("../resources/icons/bundled/", $name, ".svg"));
                cache.insert(
                    IconCacheKey {
                        name: $name,
                        size: $size,
                    },
                    svg::Handle::from_memory(data),
                );
            };
        }

        bundle!("view-refresh-symbolic", 21);
        bundle!("list-add-symbolic", 21);
        bundle!("emblem-system-symbolic", 21);
        bundle!("edit-copy-symbolic", 21);
        bundle!("go-previous-symbolic", 21);
        bundle!("user-trash-full-symbolic", 21);

        Self { cache }
    }

    fn get_handle(&mut self, name: &'static str, size: u16) -> svg::Handle {
        self.cache
            .entry(IconCacheKey { name, size })
            .or_insert_with(|| svg::Handle::from_memory(name.as_bytes()))
            .clone()
    }
}

/// Fills the cache with the bundled icons
pub fn init() {
    ICON_CACHE.get_or_init(|| Mutex::new(IconCache::new()));
}

pub fn get_icon(name: &'static str, size: u16) -> svg::Svg<'static> {
    let handle = {
        let mut icon_cache = ICON_CACHE
            .get_or_init(|| Mutex::new(IconCache::new()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        icon_cache.get_handle(name, size)
    };

    svg::Svg::new(handle)
        .width(iced::Length::Fixed(size.into()))
        .height(iced::Length::Fixed(size.into()))
        .style(|theme: &iced::Theme, _status| svg::Style {
            color: Some(theme.palette().text),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_icons_are_cached() {
        let mut cache = IconCache::new();

        assert_eq!(cache.cache.len(), 6);
        let first = cache.get_handle("edit-copy-symbolic", 21);
        let second = cache.get_handle("edit-copy-symbolic", 21);
        assert_eq!(first.id(), second.id());
        assert_eq!(cache.cache.len(), 6);
    }
}
