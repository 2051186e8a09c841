//! The ten named dispersal-distance distributions used by the radial
//! kernel family, plus the von Mises circular distribution used for wind
//! direction.
//!
//! Each distribution is grounded in its own original-source header
//! (`cauchy_kernel.hpp`, `power_law_kernel.hpp`, `exponential_power_kernel.hpp`,
//! and the sibling `*_kernel.hpp` files for the rest): every `pdf`/`icdf`
//! formula below is carried over unchanged. Sampling uses `rand_distr`'s
//! native sampler where one exists (Cauchy, Exponential, Weibull, Normal,
//! LogNormal, Gamma — matching the source's own use of `std::`
//! distribution objects for exactly these), and `icdf(Uniform(0,1))` for the
//! four kernels with no `rand_distr` counterpart (PowerLaw,
//! ExponentialPower, HyperbolicSecant, Logistic — matching the source's own
//! icdf-driven `random()` for exactly these).

use rand::Rng;
use rand_distr::Distribution as RandDistribution;
use std::f64::consts::PI;

/// One of the ten radial dispersal-distance distributions, fully
/// parameterized.
#[derive(Debug, Clone, Copy)]
pub enum RadialDistribution {
    Cauchy { s: f64 },
    Exponential { scale: f64 },
    Weibull { shape: f64, scale: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Normal { mu: f64, sigma: f64 },
    PowerLaw { xmin: f64, alpha: f64 },
    HyperbolicSecant { s: f64 },
    Logistic { location: f64, scale: f64 },
    Gamma { shape: f64, scale: f64 },
    ExponentialPower { alpha: f64, beta: f64 },
}

impl RadialDistribution {
    /// Draw a non-negative distance. All ten constructions sample a
    /// folded/one-sided value, matching the source, which always feeds the
    /// result into `abs()` or a naturally one-sided formula at the radial
    /// kernel call site.
    ///
    /// Generic over `R: Rng + ?Sized` (not `impl Rng`, which defaults to
    /// `Sized`) so this can be driven through a `&mut dyn RngCore` held by
    /// the object-safe `Kernel` trait.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            RadialDistribution::Cauchy { s } => {
                let d = rand_distr::Cauchy::new(0.0, s).expect("cauchy scale > 0");
                d.sample(rng).abs()
            }
            RadialDistribution::Exponential { scale } => {
                let d = rand_distr::Exp::new(1.0 / scale).expect("exponential scale > 0");
                d.sample(rng)
            }
            RadialDistribution::Weibull { shape, scale } => {
                let d = rand_distr::Weibull::new(scale, shape).expect("weibull params > 0");
                d.sample(rng)
            }
            RadialDistribution::Normal { mu, sigma } => {
                let d = rand_distr::Normal::new(mu, sigma).expect("normal sigma > 0");
                d.sample(rng).abs()
            }
            RadialDistribution::LogNormal { mu, sigma } => {
                let d = rand_distr::LogNormal::new(mu, sigma).expect("lognormal sigma > 0");
                d.sample(rng)
            }
            RadialDistribution::Gamma { shape, scale } => {
                let d = rand_distr::Gamma::new(shape, scale).expect("gamma params > 0");
                d.sample(rng)
            }
            RadialDistribution::PowerLaw { xmin, alpha } => {
                let x: f64 = rng.gen_range(0.0..1.0);
                let xmin = if xmin <= 0.0 { 0.01 } else { xmin };
                RadialDistribution::PowerLaw { xmin, alpha }.icdf(x)
            }
            RadialDistribution::ExponentialPower { .. }
            | RadialDistribution::HyperbolicSecant { .. }
            | RadialDistribution::Logistic { .. } => {
                let x: f64 = rng.gen_range(0.0..1.0);
                self.icdf(x)
            }
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match *self {
            RadialDistribution::Cauchy { s } => 1.0 / ((s * PI) * (1.0 + (x / s).powi(2))),
            RadialDistribution::Exponential { scale } => {
                if x < 0.0 {
                    0.0
                } else {
                    (1.0 / scale) * (-x / scale).exp()
                }
            }
            RadialDistribution::Weibull { shape, scale } => {
                if x < 0.0 {
                    0.0
                } else {
                    (shape / scale) * (x / scale).powf(shape - 1.0) * (-(x / scale).powf(shape)).exp()
                }
            }
            RadialDistribution::Normal { mu, sigma } => {
                let z = (x - mu) / sigma;
                (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
            }
            RadialDistribution::LogNormal { mu, sigma } => {
                if x <= 0.0 {
                    0.0
                } else {
                    let z = (x.ln() - mu) / sigma;
                    (-0.5 * z * z).exp() / (x * sigma * (2.0 * PI).sqrt())
                }
            }
            RadialDistribution::PowerLaw { xmin, alpha } => {
                if x <= 0.0 || xmin == 0.0 || alpha <= 1.0 {
                    0.0
                } else {
                    ((alpha - 1.0) / xmin) * (x / xmin).powf(-alpha)
                }
            }
            RadialDistribution::HyperbolicSecant { s } => {
                1.0 / (2.0 * s) * (1.0 / (PI * x / (2.0 * s)).cosh())
            }
            RadialDistribution::Logistic { location, scale } => {
                let z = (-(x - location) / scale).exp();
                z / (scale * (1.0 + z).powi(2))
            }
            RadialDistribution::Gamma { shape, scale } => {
                if x <= 0.0 {
                    0.0
                } else {
                    x.powf(shape - 1.0) * (-x / scale).exp() / (scale.powf(shape) * gamma_fn(shape))
                }
            }
            RadialDistribution::ExponentialPower { alpha, beta } => {
                if beta == 0.0 {
                    0.0
                } else {
                    (beta / (2.0 * alpha * gamma_fn(1.0 / beta))) * (-x / alpha).exp().powf(beta)
                }
            }
        }
    }

    pub fn icdf(&self, p: f64) -> f64 {
        match *self {
            RadialDistribution::Cauchy { s } => s * (PI * (p - 0.5)).tan(),
            RadialDistribution::Exponential { scale } => -scale * (1.0 - p).ln(),
            RadialDistribution::Weibull { shape, scale } => scale * (-(1.0 - p).ln()).powf(1.0 / shape),
            RadialDistribution::Normal { mu, sigma } => mu + sigma * std::f64::consts::SQRT_2 * erfinv(2.0 * p - 1.0),
            RadialDistribution::LogNormal { mu, sigma } => {
                (mu + sigma * std::f64::consts::SQRT_2 * erfinv(2.0 * p - 1.0)).exp()
            }
            RadialDistribution::PowerLaw { xmin, alpha } => {
                if p <= 0.0 || xmin == 0.0 || alpha <= 1.0 {
                    0.0
                } else {
                    p.powf(1.0 / (-alpha + 1.0)) * xmin
                }
            }
            RadialDistribution::HyperbolicSecant { s } => (2.0 * s / PI) * (PI * p / 2.0).tan().ln(),
            RadialDistribution::Logistic { location, scale } => location + scale * (p / (1.0 - p)).ln(),
            RadialDistribution::Gamma { shape, scale } => gamma_icdf(shape, scale, p),
            RadialDistribution::ExponentialPower { alpha, beta } => {
                let gamma = gamma_icdf(1.0 / beta, 1.0 / alpha.powf(beta), 2.0 * (p - 0.5).abs());
                (p - 0.5) * gamma.powf(1.0 / beta)
            }
        }
    }
}

/// Circular (wind direction) distribution. Degenerates to uniform on
/// `[0, 2*pi)` when `kappa <= 1e-6`, matching the boundary case in
/// `radial_kernel.hpp`'s `von_mises_distribution`.
#[derive(Debug, Clone, Copy)]
pub struct VonMises {
    mu: f64,
    kappa: f64,
}

impl VonMises {
    pub fn new(mu: f64, kappa: f64) -> Self {
        VonMises { mu, kappa: kappa.max(0.0) }
    }

    /// Best-Fisher rejection-sampling algorithm.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.kappa <= 1e-6 {
            return rng.gen_range(0.0..(2.0 * PI));
        }
        let a = 1.0 + (1.0 + 4.0 * self.kappa * self.kappa).sqrt();
        let b = (a - (2.0 * a).sqrt()) / (2.0 * self.kappa);
        let r = (1.0 + b * b) / (2.0 * b);

        loop {
            let u1: f64 = rng.gen_range(0.0..1.0);
            let z = (PI * u1).cos();
            let f = (1.0 + r * z) / (r + z);
            let c = self.kappa * (r - f);
            let u2: f64 = rng.gen_range(0.0..1.0);
            if c * (2.0 - c) - u2 > 0.0 || (c / u2).ln() + 1.0 - c >= 0.0 {
                let u3: f64 = rng.gen_range(0.0..1.0);
                let sign = if u3 - 0.5 < 0.0 { -1.0 } else { 1.0 };
                let theta = sign * f.acos() + self.mu;
                return theta.rem_euclid(2.0 * PI);
            }
        }
    }
}

/// Lanczos approximation of `Gamma(x)` for `x > 0`.
fn gamma_fn(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        PI / ((PI * x).sin() * gamma_fn(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut a = COEFFS[0];
        let t = x + G + 0.5;
        for (i, c) in COEFFS.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
    }
}

fn ln_gamma(x: f64) -> f64 {
    gamma_fn(x).ln()
}

/// Regularized lower incomplete gamma function `P(s, x)`, via series
/// expansion (`x < s+1`) or continued fraction (`x >= s+1`) — the standard
/// pair of algorithms (Numerical Recipes §6.2) for evaluating the gamma
/// CDF.
fn lower_incomplete_gamma_regularized(s: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < s + 1.0 {
        let mut term = 1.0 / s;
        let mut sum = term;
        let mut n = s;
        for _ in 0..500 {
            n += 1.0;
            term *= x / n;
            sum += term;
            if term.abs() < sum.abs() * 1e-14 {
                break;
            }
        }
        sum * (-x + s * x.ln() - ln_gamma(s)).exp()
    } else {
        let mut b = x + 1.0 - s;
        let mut c = 1e300;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..500 {
            let an = -(i as f64) * (i as f64 - s);
            b += 2.0;
            d = an * d + b;
            if d.abs() < 1e-300 {
                d = 1e-300;
            }
            c = b + an / c;
            if c.abs() < 1e-300 {
                c = 1e-300;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < 1e-14 {
                break;
            }
        }
        1.0 - (-x + s * x.ln() - ln_gamma(s)).exp() * h
    }
}

/// Invert the gamma CDF at probability `p` via bisection on
/// `lower_incomplete_gamma_regularized`. Good to within `1e-9` of the true
/// quantile for the ranges this engine exercises (dispersal distances).
fn gamma_icdf(shape: f64, scale: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let mut lo = 0.0_f64;
    let mut hi = (shape * scale).max(1.0);
    while lower_incomplete_gamma_regularized(shape, hi / scale) < p {
        hi *= 2.0;
        if hi > 1e15 {
            break;
        }
    }
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        if lower_incomplete_gamma_regularized(shape, mid / scale) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Inverse error function via a rational (Winitzki) initial guess refined
/// by two Newton steps against `erf`.
fn erfinv(x: f64) -> f64 {
    let w = -((1.0 - x) * (1.0 + x)).ln();
    let mut p: f64;
    if w < 5.0 {
        let w = w - 2.5;
        p = 2.810_226_36e-08;
        p = 3.432_739_39e-07 + p * w;
        p = -3.523_387_71e-06 + p * w;
        p = -4.391_506_54e-06 + p * w;
        p = 0.000_218_580_87 + p * w;
        p = -0.001_253_725_03 + p * w;
        p = -0.004_177_682_3 + p * w;
        p = 0.246_640_727 + p * w;
        p = 1.501_409_41 + p * w;
    } else {
        let w = w.sqrt() - 3.0;
        p = -0.000_200_214_257;
        p = 0.000_100_950_558 + p * w;
        p = 0.001_349_343_22 + p * w;
        p = -0.003_673_428_44 + p * w;
        p = 0.005_739_507_73 + p * w;
        p = -0.007_622_461_3 + p * w;
        p = 0.009_438_870_47 + p * w;
        p = 1.001_674_06 + p * w;
        p = 2.832_976_82 + p * w;
    }
    let mut result = p * x;
    // Two Newton refinement steps against erf for extra precision.
    for _ in 0..2 {
        let err = erf(result) - x;
        result -= err / (2.0 / PI.sqrt() * (-result * result).exp());
    }
    result
}

fn erf(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26.
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254_829_592;
    let a2 = -0.284_496_736;
    let a3 = 1.421_413_741;
    let a4 = -1.453_152_027;
    let a5 = 1.061_405_429;
    let p = 0.327_591_1;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn cauchy_icdf_matches_formula() {
        let d = RadialDistribution::Cauchy { s: 1.0 };
        assert!((d.icdf(0.5) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn power_law_zero_guards() {
        let d = RadialDistribution::PowerLaw { xmin: 0.0, alpha: 2.0 };
        assert_eq!(d.icdf(0.5), 0.0);
        assert_eq!(d.pdf(1.0), 0.0);
        let d = RadialDistribution::PowerLaw { xmin: 1.0, alpha: 0.5 };
        assert_eq!(d.icdf(0.5), 0.0);
    }

    #[test]
    fn von_mises_degenerate_is_uniform_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let vm = VonMises::new(0.0, 0.0);
        for _ in 0..50 {
            let theta = vm.sample(&mut rng);
            assert!((0.0..2.0 * PI).contains(&theta));
        }
    }

    #[test]
    fn gamma_icdf_roundtrips_through_cdf() {
        let p = lower_incomplete_gamma_regularized(2.0, 3.0 / 1.0);
        let x = gamma_icdf(2.0, 1.0, p);
        assert!((x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn erf_and_erfinv_are_inverses() {
        for x in [-0.9, -0.3, 0.0, 0.4, 0.8] {
            let y = erf(x);
            let back = erfinv(y);
            assert!((back - x).abs() < 1e-6, "x={x} back={back}");
        }
    }

    #[test]
    fn distributions_sample_without_panicking() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let dists = [
            RadialDistribution::Cauchy { s: 1.0 },
            RadialDistribution::Exponential { scale: 2.0 },
            RadialDistribution::Weibull { shape: 1.5, scale: 2.0 },
            RadialDistribution::LogNormal { mu: 0.0, sigma: 1.0 },
            RadialDistribution::Normal { mu: 0.0, sigma: 1.0 },
            RadialDistribution::PowerLaw { xmin: 1.0, alpha: 2.0 },
            RadialDistribution::HyperbolicSecant { s: 1.0 },
            RadialDistribution::Logistic { location: 0.0, scale: 1.0 },
            RadialDistribution::Gamma { shape: 2.0, scale: 1.0 },
            RadialDistribution::ExponentialPower { alpha: 1.0, beta: 1.0 },
        ];
        for d in dists {
            let _ = d.sample(&mut rng);
        }
    }
}
