//! DOM rendering surface.
//!
//! ```text
//! .sphere-root                 --radius
//!   main.sphere-main           pointer target
//!     .stage                   perspective: 2R
//!       .sphere                shell transform
//!         .sphere-item[data-slot]   static slot transform
//!           .item__image            hover transform
//!             img
//! ```

use dome::{
    GalleryEngine, SLOT_SPAN, ShellSurface, ShellTransform, SlotId, ViewportRadius, css_number,
};
use foundation::math::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlImageElement};

const MAIN_CSS: &str = "position:absolute;inset:0;overflow:hidden;touch-action:none;\
                        user-select:none;cursor:grab;";
const STAGE_CSS: &str = "position:absolute;inset:0;perspective:calc(var(--radius) * 2);\
                         perspective-origin:50% 50%;";
const SPHERE_CSS: &str = "position:absolute;inset:0;transform-style:preserve-3d;";
const IMAGE_CSS: &str = "position:absolute;inset:6px;border-radius:20px;overflow:hidden;\
                         transition:transform 300ms;backface-visibility:hidden;";
const IMG_CSS: &str = "width:100%;height:100%;object-fit:cover;pointer-events:none;";

pub struct DomSurface {
    root: HtmlElement,
    main: HtmlElement,
    sphere: HtmlElement,
    images: Vec<HtmlElement>,
    hovered: Option<SlotId>,
}

fn create(document: &Document, tag: &str, class: &str, css: &str) -> Result<HtmlElement, JsValue> {
    let el = document.create_element(tag)?.dyn_into::<HtmlElement>()?;
    el.set_class_name(class);
    el.style().set_css_text(css);
    Ok(el)
}

impl DomSurface {
    pub fn mount(
        document: &Document,
        root: HtmlElement,
        engine: &GalleryEngine,
    ) -> Result<Self, JsValue> {
        root.class_list().add_1("sphere-root")?;
        let main = create(document, "main", "sphere-main", MAIN_CSS)?;
        let stage = create(document, "div", "stage", STAGE_CSS)?;
        let sphere = create(document, "div", "sphere", SPHERE_CSS)?;
        stage.append_child(&sphere)?;
        main.append_child(&stage)?;
        root.append_child(&main)?;

        let mut surface = Self {
            root,
            main,
            sphere,
            images: Vec::new(),
            hovered: None,
        };
        surface.rebuild_items(document, engine)?;
        engine.present(&mut surface);
        Ok(surface)
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub fn main(&self) -> &HtmlElement {
        &self.main
    }

    /// Replaces every slot element with ones for the engine's current layout.
    pub fn rebuild_items(
        &mut self,
        document: &Document,
        engine: &GalleryEngine,
    ) -> Result<(), JsValue> {
        self.sphere.set_inner_html("");
        self.images.clear();
        self.hovered = None;

        let segments = engine.layout().segment_count();
        let edge_factor = if segments == 0 {
            0.0
        } else {
            std::f64::consts::PI / segments as f64 * SLOT_SPAN as f64
        };
        let size = format!("calc(var(--radius) * {})", css_number(edge_factor));

        for placed in engine.layout().items() {
            let Some(transform) = engine.item_transform_css(placed.slot) else {
                continue;
            };
            let item = create(
                document,
                "div",
                "sphere-item",
                &format!(
                    "position:absolute;left:50%;top:50%;width:{size};height:{size};\
                     margin:calc({size} / -2) 0 0 calc({size} / -2);\
                     transform-style:preserve-3d;backface-visibility:hidden;\
                     transform:{transform};"
                ),
            )?;
            item.set_attribute("data-slot", &placed.slot.0.to_string())?;

            let image = create(document, "div", "item__image", IMAGE_CSS)?;
            if placed.has_media() {
                let img = document
                    .create_element("img")?
                    .dyn_into::<HtmlImageElement>()?;
                img.set_src(&placed.media.image);
                img.set_alt(&placed.media.label);
                img.set_draggable(false);
                img.style().set_css_text(IMG_CSS);
                image.append_child(&img)?;
            }
            item.append_child(&image)?;
            self.sphere.append_child(&item)?;
            self.images.push(image);
        }
        Ok(())
    }

    /// Centre of the pointer target in client coordinates.
    pub fn center(&self) -> Vec2 {
        let rect = self.main.get_bounding_client_rect();
        Vec2::new(
            rect.left() + rect.width() / 2.0,
            rect.top() + rect.height() / 2.0,
        )
    }

    /// Moves the hover transform to the engine's hovered slot.
    pub fn sync_hover(&mut self, engine: &GalleryEngine) {
        let next = engine.hovered();
        if next == self.hovered {
            return;
        }
        if let Some(prev) = self.hovered.and_then(|s| self.images.get(s.index())) {
            let _ = prev.style().remove_property("transform");
        }
        if let Some(slot) = next {
            if let (Some(el), Some(css)) = (self.images.get(slot.index()), engine.hover_css(slot)) {
                let _ = el.style().set_property("transform", &css);
            }
        }
        self.hovered = next;
    }

    pub fn detach(&self) {
        self.main.remove();
        let _ = self.root.class_list().remove_1("sphere-root");
    }
}

impl ShellSurface for DomSurface {
    fn apply_radius(&mut self, radius: ViewportRadius) {
        let _ = self.root.style().set_property("--radius", &radius.css());
    }

    fn apply_shell(&mut self, transform: &ShellTransform) {
        let _ = self.sphere.style().set_property("transform", &transform.css());
    }
}
