// Internationalization: UI chrome strings per language and the process-wide language selection

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Uz,
    Ru,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Uz => "uz",
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    /// Accepts bare codes and region-tagged ones (`ru-RU`, `en_US`), case-insensitive.
    pub fn from_code(raw: &str) -> Option<Language> {
        let primary = raw
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "uz" => Some(Language::Uz),
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Picks the first supported language out of an `Accept-Language` header value.
    pub fn from_accept_language(header: &str) -> Option<Language> {
        header
            .split(',')
            .map(|part| part.split(';').next().unwrap_or(""))
            .find_map(Language::from_code)
    }

    pub fn all() -> &'static [Language] {
        &[Language::Uz, Language::Ru, Language::En]
    }

    /// Value sent as `Accept-Language` on every API call.
    pub fn header_value(&self) -> &'static str {
        self.code()
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Uz
    }
}

const UZ: &[(&str, &str)] = &[
    ("nav_home", "Bosh sahifa"),
    ("nav_about", "Biz haqimizda"),
    ("nav_products", "Mahsulotlar"),
    ("nav_services", "Xizmatlar"),
    ("nav_contact", "Aloqa"),
    ("all", "Barchasi"),
    ("search_placeholder", "Qidirish..."),
    ("not_found", "Hech narsa topilmadi"),
    ("page_not_found", "Sahifa topilmadi"),
    ("error_title", "Ma'lumotlarni yuklashda xatolik yuz berdi"),
    ("config_error", "Sayt sozlamalarida xatolik"),
    ("retry", "Qayta urinish"),
    ("loading", "Yuklanmoqda..."),
    ("previous", "Oldingi"),
    ("next", "Keyingi"),
    ("price_on_request", "Narxi so'rov bo'yicha"),
    ("discount", "Chegirma"),
    ("more_details", "Batafsil"),
    ("our_partners", "Hamkorlarimiz"),
    ("about_title", "Kompaniya haqida"),
    ("about_body", "Biz qishloq xo'jaligi texnikasi va ehtiyot qismlarini yetkazib beramiz, servis xizmatlarini ko'rsatamiz."),
    ("contact_title", "Biz bilan bog'laning"),
    ("full_name", "To'liq ism"),
    ("phone", "Telefon raqami"),
    ("message", "Xabar"),
    ("send", "Yuborish"),
    ("name_required", "Iltimos, ismingizni kiriting"),
    ("phone_invalid", "Telefon raqami noto'g'ri"),
    ("message_required", "Iltimos, xabar matnini kiriting"),
    ("contact_success", "Xabaringiz yuborildi"),
    ("contact_error", "Xabarni yuborib bo'lmadi, keyinroq urinib ko'ring"),
    ("contact_pending", "Xabar yuborilmoqda"),
    ("quick_links", "Tezkor havolalar"),
    ("all_rights_reserved", "Barcha huquqlar himoyalangan"),
];

const RU: &[(&str, &str)] = &[
    ("nav_home", "Главная"),
    ("nav_about", "О нас"),
    ("nav_products", "Продукция"),
    ("nav_services", "Услуги"),
    ("nav_contact", "Контакты"),
    ("all", "Все"),
    ("search_placeholder", "Поиск..."),
    ("not_found", "Ничего не найдено"),
    ("page_not_found", "Страница не найдена"),
    ("error_title", "Не удалось загрузить данные"),
    ("config_error", "Ошибка конфигурации сайта"),
    ("retry", "Повторить"),
    ("loading", "Загрузка..."),
    ("previous", "Назад"),
    ("next", "Вперёд"),
    ("price_on_request", "Цена по запросу"),
    ("discount", "Скидка"),
    ("more_details", "Подробнее"),
    ("our_partners", "Наши партнёры"),
    ("about_title", "О компании"),
    ("about_body", "Мы поставляем сельскохозяйственную технику и запчасти, а также оказываем сервисные услуги."),
    ("contact_title", "Свяжитесь с нами"),
    ("full_name", "Полное имя"),
    ("phone", "Номер телефона"),
    ("message", "Сообщение"),
    ("send", "Отправить"),
    ("name_required", "Пожалуйста, введите имя"),
    ("phone_invalid", "Неверный номер телефона"),
    ("message_required", "Пожалуйста, введите сообщение"),
    ("contact_success", "Ваше сообщение отправлено"),
    ("contact_error", "Не удалось отправить сообщение, попробуйте позже"),
    ("contact_pending", "Сообщение отправляется"),
    ("quick_links", "Быстрые ссылки"),
    ("all_rights_reserved", "Все права защищены"),
];

const EN: &[(&str, &str)] = &[
    ("nav_home", "Home"),
    ("nav_about", "About us"),
    ("nav_products", "Products"),
    ("nav_services", "Services"),
    ("nav_contact", "Contact"),
    ("all", "All"),
    ("search_placeholder", "Search..."),
    ("not_found", "Nothing found"),
    ("page_not_found", "Page not found"),
    ("error_title", "Failed to load data"),
    ("config_error", "Site configuration error"),
    ("retry", "Retry"),
    ("loading", "Loading..."),
    ("previous", "Previous"),
    ("next", "Next"),
    ("price_on_request", "Price on request"),
    ("discount", "Discount"),
    ("more_details", "More details"),
    ("our_partners", "Our partners"),
    ("about_title", "About the company"),
    ("about_body", "We supply agricultural machinery and spare parts and provide service and maintenance."),
    ("contact_title", "Get in touch"),
    ("full_name", "Full name"),
    ("phone", "Phone number"),
    ("message", "Message"),
    ("send", "Send"),
    ("name_required", "Please enter your name"),
    ("phone_invalid", "Invalid phone number"),
    ("message_required", "Please enter a message"),
    ("contact_success", "Your message has been sent"),
    ("contact_error", "Could not send the message, please try again later"),
    ("contact_pending", "Message is being sent"),
    ("quick_links", "Quick links"),
    ("all_rights_reserved", "All rights reserved"),
];

pub struct Translations {
    messages: HashMap<Language, HashMap<&'static str, &'static str>>,
}

impl Translations {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        for (language, table) in [(Language::Uz, UZ), (Language::Ru, RU), (Language::En, EN)] {
            messages.insert(language, table.iter().copied().collect());
        }
        Self { messages }
    }

    /// Missing keys come back unchanged; there is no cross-language fallback.
    pub fn get(&self, language: Language, key: &str) -> String {
        self.messages
            .get(&language)
            .and_then(|msgs| msgs.get(key))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translator(&self, language: Language) -> Translator<'_> {
        Translator {
            translations: self,
            language,
        }
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::new()
    }
}

/// Translations bound to one language.
#[derive(Clone, Copy)]
pub struct Translator<'a> {
    translations: &'a Translations,
    language: Language,
}

impl<'a> Translator<'a> {
    pub fn t(&self, key: &str) -> String {
        self.translations.get(self.language, key)
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

pub trait LanguageStorage: Send + Sync {
    fn load(&self) -> Option<Language>;
    fn save(&self, language: Language) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    value: Mutex<Option<Language>>,
}

impl LanguageStorage for MemoryStorage {
    fn load(&self) -> Option<Language> {
        self.value.lock().ok().and_then(|v| *v)
    }

    fn save(&self, language: Language) -> Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| anyhow::anyhow!("language storage lock poisoned"))?;
        *value = Some(language);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedLanguage {
    language: Language,
}

/// Persists the selection as `{"language":"ru"}`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LanguageStorage for FileStorage {
    fn load(&self) -> Option<Language> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<PersistedLanguage>(&raw) {
            Ok(persisted) => Some(persisted.language),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable language store {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, language: Language) -> Result<()> {
        let body = serde_json::to_string(&PersistedLanguage { language })?;
        fs::write(&self.path, body)
            .with_context(|| format!("Failed to write language store {}", self.path.display()))
    }
}

/// Process-wide language selection. `set` is the only mutator.
pub struct LanguageStore {
    sender: watch::Sender<Language>,
    storage: Box<dyn LanguageStorage>,
}

impl LanguageStore {
    pub fn new(storage: Box<dyn LanguageStorage>, default: Language) -> Self {
        let initial = storage.load().unwrap_or(default);
        let (sender, _) = watch::channel(initial);
        Self { sender, storage }
    }

    pub fn current(&self) -> Language {
        *self.sender.borrow()
    }

    /// Switches language, persists it and wakes subscribers. Returns false if unchanged.
    pub fn set(&self, language: Language) -> bool {
        if self.current() == language {
            return false;
        }
        self.sender.send_replace(language);
        if let Err(e) = self.storage.save(language) {
            log::warn!("Language switched to {} but not persisted: {:?}", language.code(), e);
        }
        log::info!("Language switched to {}", language.code());
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<Language> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_russian() {
        let translations = Translations::new();
        assert_eq!(translations.get(Language::Ru, "nav_products"), "Продукция");
        assert_eq!(translations.translator(Language::Uz).t("all"), "Barchasi");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let translations = Translations::new();
        assert_eq!(translations.get(Language::En, "no_such_key"), "no_such_key");
    }

    #[test]
    fn test_every_language_has_the_same_keys() {
        let translations = Translations::new();
        for (key, _) in EN {
            for language in Language::all() {
                assert_ne!(translations.get(*language, key), *key, "{} missing in {:?}", key, language);
            }
        }
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("RU-ru"), Some(Language::Ru));
        assert_eq!(Language::from_code("en_US"), Some(Language::En));
        assert_eq!(Language::from_code("de"), None);
        assert_eq!(
            Language::from_accept_language("de-DE,ru;q=0.9,en;q=0.8"),
            Some(Language::Ru)
        );
    }

    #[test]
    fn test_store_notifies_and_persists() {
        let store = LanguageStore::new(Box::new(MemoryStorage::default()), Language::Uz);
        let mut rx = store.subscribe();
        assert_eq!(store.current(), Language::Uz);

        assert!(store.set(Language::Ru));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Language::Ru);
        assert!(!store.set(Language::Ru));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("language.json");

        let store = LanguageStore::new(Box::new(FileStorage::new(&path)), Language::Uz);
        store.set(Language::En);
        drop(store);

        let reopened = LanguageStore::new(Box::new(FileStorage::new(&path)), Language::Uz);
        assert_eq!(reopened.current(), Language::En);
    }

    #[test]
    fn test_file_storage_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("language.json");
        fs::write(&path, "not json").unwrap();

        let store = LanguageStore::new(Box::new(FileStorage::new(&path)), Language::Ru);
        assert_eq!(store.current(), Language::Ru);
    }
}
