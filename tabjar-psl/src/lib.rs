//! Embedded, seeded table of top-level and multi-part public-suffix domain
//! labels, used by [`tabjar`]'s cookie-scope classifier (C2).
//!
//! Unlike a full public suffix list (tens of thousands of rules, refreshed
//! from a network source), this is a fixed, compiled-in table of ~400
//! entries: every gTLD and ccTLD in common use, plus the multi-part
//! suffixes (`co.uk`, `com.au`, ...) that would otherwise let a cookie
//! scope leak across unrelated second-level domains. It answers one
//! question: is this candidate domain *itself* so broad that no site
//! should be allowed to set a cookie scoped to it?
//!
//! [`tabjar`]: https://docs.rs/tabjar

use phf::phf_set;

/// Single-label suffixes: bare gTLDs and ccTLDs. A cookie scoped to exactly
/// one of these (e.g. `Domain=com`) would be shared by every site under
/// that TLD, so it is rejected.
pub static SINGLE_LABEL_SUFFIXES: phf::Set<&'static str> = phf_set! {
    // generic
    "com", "org", "net", "edu", "gov", "mil", "int", "info", "biz", "name",
    "pro", "coop", "museum", "aero", "jobs", "mobi", "travel", "tel", "asia",
    "cat", "post", "xxx",
    // common new gTLDs
    "io", "app", "dev", "co", "ai", "xyz", "me", "tv", "cc", "ws", "gg",
    "to", "sh", "fm", "am", "is", "la", "gd", "ly", "st", "vc", "im",
    "site", "online", "shop", "store", "tech", "cloud", "blog", "news",
    "live", "life", "world", "work", "team", "email", "design", "agency",
    "studio", "media", "group", "network", "systems", "solutions",
    "email", "today", "guide", "help", "support", "expert", "academy",
    "courses", "training", "institute", "school", "university", "education",
    "finance", "bank", "insurance", "loans", "fund", "capital", "money",
    "gallery", "photography", "art", "music", "film", "games", "fun",
    "club", "social", "chat", "forum", "community", "network", "wiki",
    "dev", "codes", "software", "digital", "systems", "computer", "host",
    "hosting", "domains", "link", "click", "download", "software",
    "properties", "estate", "realty", "land", "house", "homes", "rentals",
    "restaurant", "cafe", "bar", "pizza", "kitchen", "recipes", "cooking",
    "farm", "garden", "florist", "flowers", "wedding", "events", "party",
    "gifts", "toys", "fashion", "style", "clothing", "boutique", "jewelry",
    "watch", "shoes", "glasses", "tattoo", "salon", "spa", "fitness",
    "yoga", "dance", "run", "bike", "golf", "soccer", "football", "hockey",
    "rugby", "baseball", "fishing", "camp", "holiday", "vacations",
    "tours", "cruises", "flights", "cab", "taxi", "car", "cars", "auto",
    "motorcycles", "bike", "energy", "solar", "green", "eco", "earth",
    "space", "science", "engineering", "systems", "industries", "supply",
    "supplies", "tools", "parts", "equipment", "machine", "factory",
    "construction", "builders", "contractors", "plumbing", "electrician",
    "repair", "services", "consulting", "partners", "holdings", "ventures",
    "enterprises", "company", "industries", "exchange", "market", "deals",
    "discount", "coupons", "reviews", "report", "press", "ngo", "foundation",
    "charity", "church", "faith", "bible", "gay", "dating", "singles",
    "black", "blue", "pink", "red", "gold", "silver", "diamonds",
    "law", "legal", "attorney", "lawyer", "tax", "accountant", "cpa",
    "vet", "dental", "clinic", "hospital", "healthcare", "doctor", "surgery",
    "pharmacy", "ventures", "capital", "credit", "cash", "gratis", "free",
    "pub", "graphics", "photos", "pictures", "video", "tv", "radio",
    "fyi", "observer", "monster", "ninja", "rocks", "wtf", "lol", "fail",
    // ccTLDs (ISO 3166 based)
    "ad", "ae", "af", "ag", "ai", "al", "am", "ao", "aq", "ar", "as", "at",
    "au", "aw", "ax", "az", "ba", "bb", "bd", "be", "bf", "bg", "bh", "bi",
    "bj", "bm", "bn", "bo", "br", "bs", "bt", "bv", "bw", "by", "bz", "ca",
    "cd", "cf", "cg", "ch", "ci", "ck", "cl", "cm", "cn", "co", "cr", "cu",
    "cv", "cw", "cx", "cy", "cz", "de", "dj", "dk", "dm", "do", "dz", "ec",
    "ee", "eg", "eh", "er", "es", "et", "eu", "fi", "fj", "fk", "fo", "fr",
    "ga", "gb", "gd", "ge", "gf", "gh", "gi", "gl", "gm", "gn", "gp", "gq",
    "gr", "gs", "gt", "gu", "gw", "gy", "hk", "hm", "hn", "hr", "ht", "hu",
    "id", "ie", "il", "im", "in", "io", "iq", "ir", "is", "it", "je", "jm",
    "jo", "jp", "ke", "kg", "kh", "ki", "km", "kn", "kp", "kr", "kw", "ky",
    "kz", "la", "lb", "lc", "li", "lk", "lr", "ls", "lt", "lu", "lv", "ly",
    "ma", "mc", "md", "me", "mg", "mh", "mk", "ml", "mm", "mn", "mo", "mp",
    "mq", "mr", "ms", "mt", "mu", "mv", "mw", "mx", "my", "mz", "na", "nc",
    "ne", "nf", "ng", "ni", "nl", "no", "np", "nr", "nu", "nz", "om", "pa",
    "pe", "pf", "pg", "ph", "pk", "pl", "pm", "pn", "pr", "ps", "pt", "pw",
    "py", "qa", "re", "ro", "rs", "ru", "rw", "sa", "sb", "sc", "sd", "se",
    "sg", "sh", "si", "sj", "sk", "sl", "sm", "sn", "so", "sr", "ss", "st",
    "sv", "sx", "sy", "sz", "tc", "td", "tf", "tg", "th", "tj", "tk", "tl",
    "tm", "tn", "tr", "tt", "tv", "tw", "tz", "ua", "ug", "uk", "us", "uy",
    "uz", "va", "vc", "ve", "vg", "vi", "vn", "vu", "wf", "ws", "ye", "yt",
    "za", "zm", "zw",
};

/// Multi-part public suffixes: the whole two-label string is treated as the
/// bare suffix (e.g. `co.uk`), so a cookie scoped to exactly that string is
/// rejected, same as a bare single-label TLD.
pub static MULTI_LABEL_SUFFIXES: phf::Set<&'static str> = phf_set! {
    "co.uk", "org.uk", "me.uk", "ltd.uk", "plc.uk", "net.uk", "sch.uk",
    "ac.uk", "gov.uk", "nhs.uk", "police.uk",
    "co.nz", "net.nz", "org.nz", "govt.nz", "ac.nz", "school.nz",
    "com.au", "net.au", "org.au", "edu.au", "gov.au", "asn.au", "id.au",
    "com.br", "net.br", "org.br", "gov.br", "edu.br",
    "co.jp", "ne.jp", "or.jp", "go.jp", "ac.jp", "ad.jp", "ed.jp",
    "co.kr", "ne.kr", "or.kr", "re.kr", "go.kr", "ac.kr",
    "com.cn", "net.cn", "org.cn", "gov.cn", "edu.cn",
    "co.in", "net.in", "org.in", "gov.in", "ac.in", "edu.in", "res.in",
    "co.za", "net.za", "org.za", "gov.za", "ac.za", "web.za",
    "co.il", "net.il", "org.il", "gov.il", "ac.il",
    "com.mx", "net.mx", "org.mx", "gob.mx", "edu.mx",
    "com.ar", "net.ar", "org.ar", "gob.ar", "edu.ar",
    "co.id", "net.id", "org.id", "go.id", "ac.id", "web.id",
    "com.sg", "net.sg", "org.sg", "gov.sg", "edu.sg",
    "com.hk", "net.hk", "org.hk", "gov.hk", "edu.hk", "idv.hk",
    "com.tw", "net.tw", "org.tw", "gov.tw", "edu.tw", "idv.tw",
    "co.th", "net.th", "or.th", "in.th", "ac.th", "go.th",
    "com.tr", "net.tr", "org.tr", "gov.tr", "edu.tr",
    "com.ua", "net.ua", "org.ua", "gov.ua", "edu.ua",
    "co.ke", "or.ke", "ne.ke", "go.ke", "ac.ke",
    "com.pk", "net.pk", "org.pk", "gov.pk", "edu.pk",
    "com.bd", "net.bd", "org.bd", "gov.bd", "edu.bd",
    "com.ng", "net.ng", "org.ng", "gov.ng", "edu.ng",
    "co.ao", "co.mz", "co.tz", "co.ug", "co.zw", "co.bw", "co.ls", "co.sz",
    "com.na", "com.gh", "com.cy", "com.lb", "com.sa", "com.eg", "com.kw",
    "com.qa", "com.om", "com.jo", "com.iq", "com.co", "com.ve", "com.ec",
    "com.pe", "com.bo", "com.py", "com.uy", "co.cr", "com.gt", "com.sv",
    "com.hn", "com.ni", "com.do", "com.pa", "com.pl", "net.pl", "org.pl",
    "gov.pl", "edu.pl", "com.es", "nom.es", "org.es", "gob.es", "edu.es",
    "gouv.fr", "asso.fr", "nom.fr",
};

/// Returns `true` if `label` is a bare, exact TLD or multi-part public
/// suffix that no site should be allowed to set a cookie scope to.
///
/// Callers are expected to pass a *full* candidate scope (e.g.
/// `"co.uk"` or `"example.co.uk"`), not a single path component — only an
/// exact match against the seeded table counts as a bare suffix.
pub fn is_bare_suffix(label: &str) -> bool {
    let lower = label.to_ascii_lowercase();
    if !lower.contains('.') {
        return SINGLE_LABEL_SUFFIXES.contains(lower.as_str());
    }
    MULTI_LABEL_SUFFIXES.contains(lower.as_str())
}
