// Finnish value pools for the synthetic strategy.

pub const FIRST_NAMES: &[&str] = &[
    "Aino", "Aleksi", "Anna", "Antti", "Eero", "Eeva", "Elina", "Emilia", "Harri", "Heikki",
    "Helmi", "Ilkka", "Jaana", "Janne", "Johanna", "Juha", "Jukka", "Kaisa", "Kalle", "Katja",
    "Kirsi", "Lauri", "Leena", "Liisa", "Marja", "Markku", "Marko", "Mikko", "Minna", "Niina",
    "Oskari", "Outi", "Paavo", "Pekka", "Petri", "Riikka", "Sami", "Sanna", "Satu", "Seppo",
    "Sirpa", "Tapio", "Tarja", "Timo", "Tuula", "Ulla", "Veikko", "Ville", "Väinö", "Åsa",
];

pub const LAST_NAMES: &[&str] = &[
    "Aaltonen", "Ahonen", "Anttila", "Hakala", "Heikkilä", "Heinonen", "Hiltunen", "Hirvonen",
    "Hämäläinen", "Jokinen", "Järvinen", "Kallio", "Karjalainen", "Kinnunen", "Koivisto",
    "Korhonen", "Koskinen", "Laaksonen", "Lahtinen", "Laine", "Lehtinen", "Lehtonen", "Leinonen",
    "Leppänen", "Manninen", "Mattila", "Miettinen", "Mustonen", "Mäkelä", "Mäkinen", "Niemi",
    "Nieminen", "Ojala", "Peltonen", "Pitkänen", "Rantanen", "Räsänen", "Saarinen", "Salminen",
    "Salo", "Savolainen", "Tuominen", "Turunen", "Vainio", "Virtanen", "Väisänen", "Åberg",
];

pub const CITIES: &[&str] = &[
    "Espoo", "Forssa", "Hamina", "Hanko", "Heinola", "Helsinki", "Hyvinkää", "Hämeenlinna",
    "Iisalmi", "Imatra", "Joensuu", "Jyväskylä", "Jämsä", "Kajaani", "Kemi", "Kerava", "Kokkola",
    "Kotka", "Kouvola", "Kuopio", "Lahti", "Lappeenranta", "Lohja", "Loviisa", "Mikkeli",
    "Naantali", "Nokia", "Oulu", "Pietarsaari", "Pori", "Porvoo", "Raahe", "Raisio", "Rauma",
    "Riihimäki", "Rovaniemi", "Salo", "Savonlinna", "Seinäjoki", "Tampere", "Tornio", "Turku",
    "Uusikaupunki", "Vaasa", "Valkeakoski", "Vantaa", "Varkaus", "Ylöjärvi",
];

pub const STREET_WORDS: &[&str] = &[
    "Asema", "Kirkko", "Koulu", "Koivu", "Kuusi", "Mylly", "Puisto", "Ranta", "Satama", "Tehdas",
];

pub const BUSINESS_WORDS: &[&str] = &[
    "Elektro", "Kiinteistö", "Konsultointi", "Kuljetus", "Logistiikka", "Metalli", "Palvelu",
    "Rakennus", "Sähkö", "Tekniikka", "Tili", "Trading", "Vesi",
];

/// Company suffixes; a generated name already ending in one keeps it.
pub const COMPANY_SUFFIXES: &[&str] = &["Oyj", "As Oy", "Oy", "ry", "Ky", "Osk", "Tmi"];

pub const EMAIL_DOMAINS: &[&str] = &[
    "example.com", "example.fi", "example.net", "esimerkki.fi", "posti.example.fi",
];

pub const URL_TLDS: &[&str] = &["fi", "com", "net", "org"];

/// Mobile and area prefixes for domestic numbers.
pub const PHONE_PREFIXES: &[&str] = &["040", "041", "044", "045", "046", "050", "02", "03", "09"];

/// ASCII rendition for local parts and host names.
pub fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            'ä' | 'å' | 'à' | 'á' => Some('a'),
            'Ä' | 'Å' => Some('A'),
            'ö' | 'ø' => Some('o'),
            'Ö' | 'Ø' => Some('O'),
            'é' | 'è' => Some('e'),
            'ü' => Some('u'),
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}
