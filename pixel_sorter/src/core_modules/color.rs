// THEORY (single-pixel color):
// `Color` is the fundamental unit of the engine: one RGBA pixel plus the
// perceptual attributes derived from it. Everything here is a function of this
// pixel alone. Comparisons between two colors and anything that needs
// neighbors live in `fitness`.
//
// What lives here:
// - Raw channels (RGBA, 0..255). Alpha is carried through untouched.
// - HSV, normalized to [0, 1]. These are a pure function of R, G, B. Channels
//   and HSV are both private and only change together, through the constructor
//   or `set_channels`.
// - The sort key, a scratch value written by `set_sort_key` right before the
//   line sort that consumes it. Its meaning depends on the policy of that call.

pub mod color {
    use crate::core_modules::sort_policy::SortPolicy;
    use rand::Rng;

    pub type Channel = u8;
    pub type NormalizedChannel = f64;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Value = f64;
    pub type Luminance = f64;
    pub type SortKey = f64;

    const CHANNELS: usize = 4;

    /// `h2` rotates the hue wheel by this much before sorting.
    const HUE_GRAY_FIRST_SHIFT: Hue = 0.15;
    /// Below this saturation a pixel counts as gray under `h2`.
    const GRAY_SATURATION_THRESHOLD: Saturation = 0.07;
    /// How far below the hue range gray pixels are pushed under `h2`.
    const GRAY_KEY_OFFSET: SortKey = 900.0;
    /// Width of the random jitter window under `semirandom`.
    const SEMIRANDOM_JITTER: SortKey = 25.0;

    /// One RGBA pixel and its derived HSV attributes.
    ///
    /// Equality compares the channels only; the sort key is scratch state.
    #[derive(Debug, Clone, Copy)]
    pub struct Color {
        red: Channel,
        green: Channel,
        blue: Channel,
        alpha: Channel,
        hue: Hue,
        saturation: Saturation,
        value: Value,
        sort_key: SortKey,
    }

    impl PartialEq for Color {
        fn eq(&self, other: &Self) -> bool {
            self.rgba() == other.rgba()
        }
    }

    impl Eq for Color {}

    impl Default for Color {
        fn default() -> Self {
            Color::opaque(0, 0, 0)
        }
    }

    impl Color {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            let (hue, saturation, value) = Self::compute_hsv(red, green, blue);
            Color {
                red,
                green,
                blue,
                alpha,
                hue,
                saturation,
                value,
                sort_key: 0.0,
            }
        }

        /// A synthesized color (thumbnail average, interpolated sample) is fully opaque.
        pub fn opaque(red: Channel, green: Channel, blue: Channel) -> Self {
            Self::new(red, green, blue, Channel::MAX)
        }

        /// Standard RGB -> HSV with every component in [0, 1].
        ///
        /// When several channels share the maximum, red wins over green and
        /// green wins over blue for picking the hue sector.
        pub fn compute_hsv(red: Channel, green: Channel, blue: Channel) -> (Hue, Saturation, Value) {
            let r = red as NormalizedChannel / 255.0;
            let g = green as NormalizedChannel / 255.0;
            let b = blue as NormalizedChannel / 255.0;

            let value = r.max(g.max(b));
            let diff = value - r.min(g.min(b));

            if diff == 0.0 {
                return (0.0, 0.0, value);
            }

            let saturation = diff / value;
            let rr = (value - r) / 6.0 / diff + 0.5;
            let gg = (value - g) / 6.0 / diff + 0.5;
            let bb = (value - b) / 6.0 / diff + 0.5;

            let mut hue = if r == value {
                bb - gg
            } else if g == value {
                1.0 / 3.0 + rr - bb
            } else {
                2.0 / 3.0 + gg - rr
            };

            if hue < 0.0 {
                hue += 1.0;
            } else if hue >= 1.0 {
                hue -= 1.0;
            }
            (hue, saturation, value)
        }

        /// Replaces every channel and recomputes HSV. The sort key is left as is.
        pub fn set_channels(&mut self, red: Channel, green: Channel, blue: Channel, alpha: Channel) {
            let sort_key = self.sort_key;
            *self = Color::new(red, green, blue, alpha);
            self.sort_key = sort_key;
        }

        pub fn red(&self) -> Channel {
            self.red
        }

        pub fn green(&self) -> Channel {
            self.green
        }

        pub fn blue(&self) -> Channel {
            self.blue
        }

        pub fn alpha(&self) -> Channel {
            self.alpha
        }

        pub fn hue(&self) -> Hue {
            self.hue
        }

        pub fn saturation(&self) -> Saturation {
            self.saturation
        }

        pub fn value(&self) -> Value {
            self.value
        }

        pub fn sort_key(&self) -> SortKey {
            self.sort_key
        }

        /// Perceptual luminance over normalized channels, 0.30 R + 0.59 G + 0.11 B.
        pub fn luminance(&self) -> Luminance {
            self.red as Luminance / 255.0 * 0.30
                + self.green as Luminance / 255.0 * 0.59
                + self.blue as Luminance / 255.0 * 0.11
        }

        /// The channels alone, for multiset comparisons and export.
        pub fn rgba(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }

        /// Computes and stores the sort key under `policy`.
        ///
        /// `position` is the pixel's index within the line being sorted; only
        /// `semirandom` reads it. `rng` is only drawn from by the random policies.
        pub fn set_sort_key<R: Rng + ?Sized>(&mut self, policy: SortPolicy, position: usize, rng: &mut R) {
            self.sort_key = match policy {
                SortPolicy::Random => rng.gen_range(0.0..1.0),
                SortPolicy::SemiRandom => {
                    position as SortKey / 4.0 + rng.gen_range(0.0..SEMIRANDOM_JITTER)
                }
                SortPolicy::Hue => self.hue,
                SortPolicy::HueGrayFirst => {
                    let mut key = self.hue + HUE_GRAY_FIRST_SHIFT;
                    if key >= 1.0 {
                        key -= 1.0;
                    }
                    if self.saturation < GRAY_SATURATION_THRESHOLD {
                        key -= GRAY_KEY_OFFSET;
                    }
                    key
                }
                SortPolicy::Value => -self.luminance(),
                SortPolicy::Saturation => self.saturation,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::color::*;
    use crate::core_modules::sort_policy::SortPolicy;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn grays_are_achromatic() {
        for level in [0u8, 1, 77, 128, 254, 255] {
            let gray = Color::opaque(level, level, level);
            assert_eq!(gray.hue(), 0.0);
            assert_eq!(gray.saturation(), 0.0);
            assert!((gray.value() - level as f64 / 255.0).abs() < EPSILON);
        }
    }

    #[test]
    fn primaries_land_on_their_sectors() {
        let red = Color::opaque(255, 0, 0);
        assert!(red.hue().abs() < EPSILON);
        assert!((red.saturation() - 1.0).abs() < EPSILON);
        assert!((red.value() - 1.0).abs() < EPSILON);

        let green = Color::opaque(0, 255, 0);
        assert!((green.hue() - 1.0 / 3.0).abs() < EPSILON);

        let blue = Color::opaque(0, 0, 255);
        assert!((blue.hue() - 2.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn hue_stays_in_unit_range() {
        for (r, g, b) in [(255, 0, 1), (255, 0, 255), (10, 200, 30), (1, 2, 3), (200, 100, 150)] {
            let color = Color::opaque(r, g, b);
            assert!((0.0..1.0).contains(&color.hue()), "{r},{g},{b} -> {}", color.hue());
        }
    }

    #[test]
    fn value_key_orders_brightest_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut black = Color::opaque(0, 0, 0);
        let mut white = Color::opaque(255, 255, 255);
        black.set_sort_key(SortPolicy::Value, 0, &mut rng);
        white.set_sort_key(SortPolicy::Value, 1, &mut rng);
        assert_eq!(black.sort_key(), 0.0);
        assert!((white.sort_key() + 1.0).abs() < EPSILON);
        assert!(white.sort_key() < black.sort_key());
    }

    #[test]
    fn gray_first_policy_pushes_grays_900_below() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut gray = Color::opaque(120, 121, 120);
        assert!(gray.saturation() < 0.07);
        gray.set_sort_key(SortPolicy::HueGrayFirst, 0, &mut rng);
        assert!((gray.sort_key() - (gray.hue() + 0.15 - 900.0)).abs() < EPSILON);

        for (r, g, b) in [(255, 0, 0), (255, 0, 40), (0, 255, 0), (30, 30, 200), (200, 190, 180)] {
            let mut colored = Color::opaque(r, g, b);
            assert!(colored.saturation() >= 0.07);
            colored.set_sort_key(SortPolicy::HueGrayFirst, 0, &mut rng);
            assert!((0.0..1.0).contains(&colored.sort_key()));
            assert!(colored.sort_key() - gray.sort_key() > 899.0);
        }
    }

    #[test]
    fn gray_first_policy_wraps_shifted_hue() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut crimson = Color::opaque(255, 0, 100);
        assert!(crimson.hue() > 0.85);
        crimson.set_sort_key(SortPolicy::HueGrayFirst, 0, &mut rng);
        let expected = crimson.hue() + 0.15 - 1.0;
        assert!((crimson.sort_key() - expected).abs() < EPSILON);
    }

    #[test]
    fn semirandom_key_stays_near_position() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut color = Color::opaque(10, 20, 30);
        for position in [0usize, 4, 100, 4000] {
            color.set_sort_key(SortPolicy::SemiRandom, position, &mut rng);
            let base = position as f64 / 4.0;
            assert!(color.sort_key() >= base && color.sort_key() < base + 25.0);
        }
    }

    #[test]
    fn changing_channels_recomputes_hsv() {
        let mut color = Color::opaque(255, 0, 0);
        color.set_channels(0, 0, 255, 128);
        assert_eq!(color.rgba(), [0, 0, 255, 128]);
        assert!((color.hue() - 2.0 / 3.0).abs() < EPSILON);
        assert!((color.saturation() - 1.0).abs() < EPSILON);

        color.set_channels(40, 40, 40, 255);
        assert_eq!(color.hue(), 0.0);
        assert_eq!(color.saturation(), 0.0);
        assert!((color.value() - 40.0 / 255.0).abs() < EPSILON);
    }

    #[test]
    fn equality_ignores_the_sort_key() {
        let mut rng = StdRng::seed_from_u64(3);
        let plain = Color::new(10, 200, 30, 90);
        let mut keyed = plain;
        keyed.set_sort_key(SortPolicy::Random, 0, &mut rng);
        assert_ne!(keyed.sort_key(), plain.sort_key());
        assert_eq!(keyed, plain);
        assert_ne!(Color::new(10, 200, 30, 91), plain);
    }
}
