//! Description parser seam.
//!
//! Parsing the flat description into a kinematic scene is not done here.
//! Callers plug in their parser through [`DescriptionParser`] and hand it to
//! [`LoadSession::build_scene`](crate::LoadSession::build_scene).

/// Turns a flat robot description into a scene.
///
/// `resolve` maps each mesh or texture reference to the location the parser
/// should load it from; an empty string means "use an empty placeholder".
///
/// # Example
///
/// ```
/// use robot_assembly::scene::DescriptionParser;
///
/// /// Counts links; a stand-in for a real URDF parser.
/// struct LinkCounter;
///
/// impl DescriptionParser for LinkCounter {
///     type Scene = usize;
///
///     fn parse(&self, text: &str, _resolve: &dyn Fn(&str) -> String) -> Result<usize, String> {
///         if !text.contains("<robot") {
///             return Err("no <robot> element".into());
///         }
///         Ok(text.matches("<link").count())
///     }
/// }
/// ```
pub trait DescriptionParser {
    /// The parsed scene.
    type Scene;

    /// Parse `text`, loading assets through `resolve`.
    ///
    /// The error is the parser's own message.
    fn parse(&self, text: &str, resolve: &dyn Fn(&str) -> String) -> Result<Self::Scene, String>;
}

impl<P: DescriptionParser + ?Sized> DescriptionParser for &P {
    type Scene = P::Scene;

    fn parse(&self, text: &str, resolve: &dyn Fn(&str) -> String) -> Result<Self::Scene, String> {
        (**self).parse(text, resolve)
    }
}
