//! Templates bundled into the binary.
//!
//! Placeholders are `{{name}}` where `name` is an identifier. Anything else
//! between double braces (e.g. Handlebars helpers) is left alone.

use playerkit_types::platform::{ServiceType, WebFramework};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub text: &'static str,
}

macro_rules! bundled {
    ($path:literal) => {
        Template {
            name: $path,
            text: include_str!(concat!("../templates/", $path)),
        }
    };
}

pub const ANDROID_ACTIVITY: Template = bundled!("android/VideoPlayerActivity.kt");
pub const ANDROID_LAYOUT: Template = bundled!("android/activity_video_player.xml");

pub const IOS_PLAYER_IVS: Template = bundled!("ios/VideoPlayer-ivs.swift");
pub const IOS_PLAYER_VLC: Template = bundled!("ios/VideoPlayer-vlc.swift");
pub const IOS_SNIPPET: Template = bundled!("ios/video-component.swift");
pub const IOS_BRIDGING_HEADER: Template = bundled!("ios/Bridging-Header.h");
pub const IOS_EMPTY_CPP: Template = bundled!("ios/empty.cpp");
pub const IOS_EMPTY_HPP: Template = bundled!("ios/empty.hpp");

pub const WEB_ANGULAR_COMPONENT: Template = bundled!("web/angular/video-player.component.ts");
pub const WEB_ANGULAR_STYLES: Template = bundled!("web/angular/video-player.component.scss");
pub const WEB_ANGULAR_SNIPPET: Template = bundled!("web/angular/snippet.html");
pub const WEB_VUE_COMPONENT: Template = bundled!("web/vue/VideoPlayer.vue");
pub const WEB_VUE_SNIPPET: Template = bundled!("web/vue/snippet.vue");
pub const WEB_EMBER_COMPONENT: Template = bundled!("web/ember/video-player.js");
pub const WEB_EMBER_SNIPPET: Template = bundled!("web/ember/snippet.hbs");
pub const WEB_REACT_COMPONENT: Template = bundled!("web/react/VideoPlayer.jsx");
pub const WEB_REACT_SNIPPET: Template = bundled!("web/react/snippet.jsx");
pub const WEB_GENERIC_COMPONENT: Template = bundled!("web/generic/VideoPlayer.js");
pub const WEB_GENERIC_SNIPPET: Template = bundled!("web/generic/snippet.js");
pub const WEB_NONE_SNIPPET: Template = bundled!("web/none/snippet.html");

pub fn ios_player(service: ServiceType) -> Template {
    match service {
        ServiceType::LowLatencyStream => IOS_PLAYER_IVS,
        ServiceType::GenericStream => IOS_PLAYER_VLC,
    }
}

/// Component template for a web framework. `None` has no component file.
pub fn web_component(framework: &WebFramework) -> Option<Template> {
    match framework {
        WebFramework::Angular => Some(WEB_ANGULAR_COMPONENT),
        WebFramework::Vue => Some(WEB_VUE_COMPONENT),
        WebFramework::Ember => Some(WEB_EMBER_COMPONENT),
        WebFramework::None => None,
        WebFramework::Other(name) if name.eq_ignore_ascii_case("react") => {
            Some(WEB_REACT_COMPONENT)
        }
        WebFramework::Other(_) => Some(WEB_GENERIC_COMPONENT),
    }
}

pub fn web_snippet(framework: &WebFramework) -> Template {
    match framework {
        WebFramework::Angular => WEB_ANGULAR_SNIPPET,
        WebFramework::Vue => WEB_VUE_SNIPPET,
        WebFramework::Ember => WEB_EMBER_SNIPPET,
        WebFramework::None => WEB_NONE_SNIPPET,
        WebFramework::Other(name) if name.eq_ignore_ascii_case("react") => WEB_REACT_SNIPPET,
        WebFramework::Other(_) => WEB_GENERIC_SNIPPET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_framework_has_a_snippet_and_all_but_none_a_component() {
        for fw in [
            WebFramework::Angular,
            WebFramework::Vue,
            WebFramework::Ember,
            WebFramework::None,
            WebFramework::Other("react".into()),
            WebFramework::Other("svelte".into()),
        ] {
            assert!(!web_snippet(&fw).text.is_empty());
            assert_eq!(web_component(&fw).is_none(), fw == WebFramework::None);
        }
    }

    #[test]
    fn ios_player_follows_service_type() {
        assert!(ios_player(ServiceType::LowLatencyStream).text.contains("AmazonIVSPlayer"));
        assert!(ios_player(ServiceType::GenericStream).text.contains("VLCMediaPlayer"));
    }
}
