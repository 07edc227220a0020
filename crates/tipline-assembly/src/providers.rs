//! Provider rule dispatch.
//!
//! Each reporting service triggers a set of independent behavior toggles.
//! Rules are predicate -> toggle pairs evaluated against the raw service
//! name; more than one rule may fire for the same report, and an unknown
//! service simply leaves every toggle off.

/// Case-sensitive service-name predicate.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Contains(&'static str),
    ContainsAny(&'static [&'static str]),
    Exact(&'static str),
    ExactAny(&'static [&'static str]),
}

impl Matcher {
    fn matches(self, esp_name: &str) -> bool {
        match self {
            Matcher::Contains(needle) => esp_name.contains(needle),
            Matcher::ContainsAny(needles) => needles.iter().any(|n| esp_name.contains(n)),
            Matcher::Exact(name) => esp_name == name,
            Matcher::ExactAny(names) => names.contains(&esp_name),
        }
    }
}

/// Behavior toggles derived from the reporting service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderRules {
    /// Show the NCMEC submittal identifier per evidence file.
    pub show_submittal_id: bool,
    /// Candidate for the Meta review-note statement on non-viewed files.
    pub meta_review_note: bool,
    /// Strip Meta boilerplate paragraphs from file descriptions.
    pub strip_meta_boilerplate: bool,
    /// Description text is newline-delimited paragraph soup with embedded
    /// JSON fragments to drop.
    pub whatsapp_paragraphs: bool,
    /// Candidate for the Bing Visual Search statement (also requires the
    /// reporter identity check).
    pub bing_visual_search_candidate: bool,
    /// X Corp: retention statement, profile narrative, webpage blocks, and
    /// the per-file upload-IP caveat.
    pub xcorp: bool,
    /// Reddit: report-level additional info and chat transcript blocks.
    pub reddit: bool,
    /// MeetMe: registration profile, private messages, login history.
    pub meetme: bool,
    /// TikTok: login captures rendered per person.
    pub tiktok_login_captures: bool,
    /// Imgur: report-level additional infos and upload-capture metadata.
    pub imgur: bool,
    /// Dropbox: upload timestamp comes from ESP metadata.
    pub dropbox_upload_metadata: bool,
}

impl ProviderRules {
    /// Fold every matching rule into one toggle set.
    pub fn for_esp(esp_name: &str) -> Self {
        type Apply = fn(&mut ProviderRules);
        let table: [(Matcher, Apply); 10] = [
            (
                Matcher::ContainsAny(&["Facebook", "Instagram"]),
                |r| r.show_submittal_id = true,
            ),
            (
                Matcher::ExactAny(&["Instagram, Inc.", "Facebook"]),
                |r| {
                    r.meta_review_note = true;
                    r.strip_meta_boilerplate = true;
                },
            ),
            (Matcher::Exact("WhatsApp Inc."), |r| {
                r.whatsapp_paragraphs = true;
            }),
            (Matcher::Contains("Microsoft"), |r| {
                r.bing_visual_search_candidate = true;
            }),
            (Matcher::Contains("X Corp"), |r| r.xcorp = true),
            (Matcher::Contains("Reddit"), |r| r.reddit = true),
            (Matcher::Contains("MeetMe"), |r| r.meetme = true),
            (Matcher::Contains("TikTok"), |r| {
                r.tiktok_login_captures = true;
            }),
            (Matcher::Contains("Imgur"), |r| r.imgur = true),
            (Matcher::Exact("Dropbox, Inc."), |r| {
                r.dropbox_upload_metadata = true;
            }),
        ];

        let mut rules = ProviderRules::default();
        for (matcher, apply) in table {
            if matcher.matches(esp_name) {
                apply(&mut rules);
            }
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_toggles_split_on_name_precision() {
        let fb = ProviderRules::for_esp("Facebook");
        assert!(fb.show_submittal_id && fb.meta_review_note && fb.strip_meta_boilerplate);
        let ig = ProviderRules::for_esp("Instagram, Inc.");
        assert!(ig.show_submittal_id && ig.meta_review_note && ig.strip_meta_boilerplate);
        // Decorated names still show the submittal id but lose the
        // exact-name behaviors.
        let decorated = ProviderRules::for_esp("Facebook, Inc.");
        assert!(decorated.show_submittal_id);
        assert!(!decorated.meta_review_note && !decorated.strip_meta_boilerplate);
    }

    #[test]
    fn substring_rules_tolerate_name_decorations() {
        assert!(ProviderRules::for_esp("Microsoft Corporation").bing_visual_search_candidate);
        assert!(ProviderRules::for_esp("X Corp.").xcorp);
        assert!(ProviderRules::for_esp("Reddit, Inc.").reddit);
        assert!(ProviderRules::for_esp("The Meet Group (MeetMe)").meetme);
        assert!(ProviderRules::for_esp("TikTok Inc.").tiktok_login_captures);
        assert!(ProviderRules::for_esp("Imgur, LLC").imgur);
    }

    #[test]
    fn exact_rules_reject_decorated_names() {
        assert!(ProviderRules::for_esp("Dropbox, Inc.").dropbox_upload_metadata);
        assert!(!ProviderRules::for_esp("Dropbox").dropbox_upload_metadata);
        assert!(ProviderRules::for_esp("WhatsApp Inc.").whatsapp_paragraphs);
        assert!(!ProviderRules::for_esp("WhatsApp LLC").whatsapp_paragraphs);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!ProviderRules::for_esp("microsoft").bing_visual_search_candidate);
        assert!(!ProviderRules::for_esp("facebook").show_submittal_id);
    }

    #[test]
    fn unknown_service_leaves_all_toggles_off() {
        assert_eq!(ProviderRules::for_esp("Snapchat Inc."), ProviderRules::default());
        assert_eq!(ProviderRules::for_esp(""), ProviderRules::default());
    }
}
