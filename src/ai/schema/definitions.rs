//! Built-in analysis schemas.
//!
//! Every shape is a JSON object at the top level so it can be requested with
//! a JSON-object response format.

use super::{FieldSpec, SchemaDescriptor, SchemaNode};

fn string_list() -> SchemaNode {
    SchemaNode::array(SchemaNode::String)
}

pub(super) fn builtin() -> Vec<SchemaDescriptor> {
    vec![
        content_analysis(),
        key_takeaways(),
        seo_metadata(),
        video_script(),
        thumbnail_concepts(),
        social_captions(),
    ]
}

fn content_analysis() -> SchemaDescriptor {
    SchemaDescriptor {
        analysis_kind: "content_analysis",
        description: "Overall reading of a piece of content: what it says, to whom, in what voice.",
        shape: SchemaNode::object([
            FieldSpec::required("summary", "2-3 sentence summary, no preamble", SchemaNode::String),
            FieldSpec::required("topics", "Main topics, most important first", string_list()),
            FieldSpec::required("tone", "Dominant tone, e.g. informative, playful, urgent", SchemaNode::String),
            FieldSpec::optional("target_audience", "Who the content is written for", SchemaNode::String),
            FieldSpec::optional("sentiment_score", "-1.0 (negative) to 1.0 (positive)", SchemaNode::Number),
            FieldSpec::optional("reading_level", "Approximate school grade level", SchemaNode::Integer),
        ]),
    }
}

fn key_takeaways() -> SchemaDescriptor {
    SchemaDescriptor {
        analysis_kind: "key_takeaways",
        description: "Short, self-contained takeaways a reader should remember.",
        shape: SchemaNode::object([FieldSpec::required(
            "takeaways",
            "3-7 one-sentence takeaways",
            string_list(),
        )]),
    }
}

fn seo_metadata() -> SchemaDescriptor {
    SchemaDescriptor {
        analysis_kind: "seo_metadata",
        description: "Search metadata for publishing the content on the web.",
        shape: SchemaNode::object([
            FieldSpec::required("title", "Under 60 characters", SchemaNode::String),
            FieldSpec::required("meta_description", "Under 160 characters", SchemaNode::String),
            FieldSpec::required("keywords", "5-10 search keywords", string_list()),
            FieldSpec::optional("slug", "lowercase-hyphenated URL slug", SchemaNode::String),
            FieldSpec::optional("og_title", "Open Graph title if different from title", SchemaNode::String),
        ]),
    }
}

fn video_script() -> SchemaDescriptor {
    let scene = SchemaNode::object([
        FieldSpec::required("scene_number", "1-based scene index", SchemaNode::Integer),
        FieldSpec::required("visual", "What is on screen", SchemaNode::String),
        FieldSpec::required("narration", "Voice-over text for the scene", SchemaNode::String),
        FieldSpec::optional("duration_seconds", "Approximate scene length", SchemaNode::Number),
    ]);

    SchemaDescriptor {
        analysis_kind: "video_script",
        description: "Short-form video script broken into scenes.",
        shape: SchemaNode::object([
            FieldSpec::required("title", "Working title", SchemaNode::String),
            FieldSpec::required("hook", "Opening line that earns the first 3 seconds", SchemaNode::String),
            FieldSpec::required("scenes", "Scenes in playback order", SchemaNode::array(scene)),
            FieldSpec::optional("call_to_action", "Closing ask", SchemaNode::String),
        ]),
    }
}

fn thumbnail_concepts() -> SchemaDescriptor {
    let concept = SchemaNode::object([
        FieldSpec::required("headline", "Short label for the concept", SchemaNode::String),
        FieldSpec::required(
            "visual_description",
            "Image-generation-ready description of the thumbnail",
            SchemaNode::String,
        ),
        FieldSpec::optional("text_overlay", "At most 5 words of overlay text", SchemaNode::String),
        FieldSpec::optional("color_palette", "Dominant colors", string_list()),
    ]);

    SchemaDescriptor {
        analysis_kind: "thumbnail_concepts",
        description: "Distinct thumbnail ideas for the content.",
        shape: SchemaNode::object([FieldSpec::required(
            "concepts",
            "2-4 distinct concepts",
            SchemaNode::array(concept),
        )]),
    }
}

fn social_captions() -> SchemaDescriptor {
    let caption = SchemaNode::object([
        FieldSpec::required("platform", "e.g. instagram, tiktok, linkedin, x", SchemaNode::String),
        FieldSpec::required("caption", "Caption text in the platform's style", SchemaNode::String),
        FieldSpec::optional("hashtags", "Hashtags without the # sign", string_list()),
    ]);

    SchemaDescriptor {
        analysis_kind: "social_captions",
        description: "Platform-specific captions for sharing the content.",
        shape: SchemaNode::object([FieldSpec::required(
            "captions",
            "One caption per platform",
            SchemaNode::array(caption),
        )]),
    }
}
