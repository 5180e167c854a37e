use std::time::{SystemTime, UNIX_EPOCH};

/// A booth layout: the template the prompt is rendered from, plus the
/// metadata the kiosk UI needs to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt_template: &'static str,
    pub prompt_defaults: &'static [(&'static str, &'static str)],
    pub preview: &'static str,
    pub aspect_ratio: &'static str,
}

pub const LAYOUT_TEMPLATES: &[LayoutTemplate] = &[
    LayoutTemplate {
        id: "retro-pop",
        name: "Retro Pop",
        description: "Bold primary colors with halftone overlay for upbeat shoots.",
        prompt_template:
            "retro pop-art halftone portrait, bold primary colors, playful composition, crisp lighting",
        prompt_defaults: &[],
        preview: "/layout/layout-1.jpeg",
        aspect_ratio: "3:4",
    },
    LayoutTemplate {
        id: "modern-luxe",
        name: "Modern Luxe",
        description: "Soft gradients, clean typography, ideal for formal events.",
        prompt_template:
            "minimalist luxury portrait, soft gradients, elegant sans serif typography, diffused lighting",
        prompt_defaults: &[],
        preview: "/layout/layout-2.jpeg",
        aspect_ratio: "4:5",
    },
    LayoutTemplate {
        id: "festival-glow",
        name: "Festival Glow",
        description: "Neon accents and lens flares suited for nightlife activations.",
        prompt_template:
            "vibrant festival portrait, neon lighting, shimmer effects, high energy, cinematic",
        prompt_defaults: &[],
        preview: "/layout/layout-3.jpeg",
        aspect_ratio: "1:1",
    },
    LayoutTemplate {
        id: "minimal-mono",
        name: "Minimal Mono",
        description: "Black and white grid ready for editorial style outputs.",
        prompt_template:
            "black and white editorial portrait, clean grid layout, high contrast, studio lighting",
        prompt_defaults: &[],
        preview: "/layout/layout-4.jpeg",
        aspect_ratio: "3:2",
    },
    LayoutTemplate {
        id: "creator-frame",
        name: "Creator Frame",
        description: "3D social frame with verified badge and custom caption callout.",
        prompt_template:
            "Stylish portrait of the character sitting position inside a white 3D {{platform}} frame cutout with the logo. Dark background, cinematic lighting, ultra-realistic. {{platform}} id :['{{handle}}'] with blue checkmark. Caption should be [\"{{caption}}\"]",
        prompt_defaults: &[("platform", "TikTok"), ("handle", "@boothcrew")],
        preview: "/layout/layout-6.jpeg",
        aspect_ratio: "9:16",
    },
];

pub fn layout_by_id(id: &str) -> Option<&'static LayoutTemplate> {
    LAYOUT_TEMPLATES.iter().find(|layout| layout.id == id)
}

/// Render a layout's prompt template, substituting `{{key}}` placeholders
/// from the overrides first, then the layout defaults. Unknown placeholders
/// are left verbatim.
pub fn build_prompt(layout: &LayoutTemplate, overrides: &[(&str, &str)]) -> String {
    let lookup = |key: &str| -> Option<&str> {
        overrides
            .iter()
            .chain(layout.prompt_defaults.iter())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let template = layout.prompt_template;
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let (head, tail) = rest.split_at(start);
        rendered.push_str(head);
        match tail[2..].find("}}") {
            Some(end) => {
                let key = &tail[2..2 + end];
                match lookup(key) {
                    Some(value) => rendered.push_str(value),
                    None => {
                        rendered.push_str("{{");
                        rendered.push_str(key);
                        rendered.push_str("}}");
                    }
                }
                rest = &tail[2 + end + 2..];
            }
            None => {
                rendered.push_str(tail);
                rest = "";
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

pub const CAPTION_TEMPLATES: &[&str] = &[
    "Best booth of the night!",
    "Caught on camera, looking sharp.",
    "Say cheese, stay golden.",
    "Straight from the photobooth.",
    "One snap, zero regrets.",
    "Lights, camera, instant classic.",
    "Framed and fabulous.",
    "Snapped it, loved it.",
];

/// Pick a caption from the pool. Selection only needs to feel varied between
/// sessions, not be cryptographically random.
pub fn random_caption() -> &'static str {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or(0);
    let index = nanos % CAPTION_TEMPLATES.len();
    CAPTION_TEMPLATES.get(index).copied().unwrap_or("Say cheese!")
}
