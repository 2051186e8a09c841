//! Builds a boxed [`Kernel`] from `Config` fields: the one place kernel
//! construction is centralized so `Model::new` stays a thin orchestrator.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{Config, Direction};
use crate::distributions::RadialDistribution;
use crate::error::{PopsError, Result};
use crate::kernels::deterministic::DeterministicKernel;
use crate::kernels::natural_anthropogenic::NaturalAnthropogenicKernel;
use crate::kernels::neighbor::DeterministicNeighborKernel;
use crate::kernels::network::NetworkKernel;
use crate::kernels::radial::RadialKernel;
use crate::kernels::uniform::UniformKernel;
use crate::kernels::{DispersalKernelType, Kernel};
use crate::network_graph::Network;
use crate::raster::Raster;

/// Build a single named kernel (radial, uniform, deterministic-neighbor, or
/// network). Used for both the natural and anthropogenic slots.
#[allow(clippy::too_many_arguments)]
pub fn build_named_kernel(
    kernel_type: DispersalKernelType,
    scale: f64,
    shape: f64,
    direction: Direction,
    kappa: f64,
    config: &Config,
    dispersers: &Rc<RefCell<Raster<i32>>>,
    network: Option<&Rc<Network>>,
) -> Result<Box<dyn Kernel>> {
    match kernel_type {
        DispersalKernelType::Uniform => Ok(Box::new(UniformKernel::new(config.rows, config.cols))),
        DispersalKernelType::DeterministicNeighbor => Ok(Box::new(DeterministicNeighborKernel::new(direction))),
        DispersalKernelType::Network => {
            let network = network.ok_or_else(|| {
                PopsError::Network("network kernel requested but no network was loaded".into())
            })?;
            Ok(Box::new(NetworkKernel::new(
                Rc::clone(network),
                config.network_min_time,
                config.network_max_time,
            )))
        }
        radial if config.use_deterministic_kernel && radial.is_radial() => {
            let distribution = radial_distribution(radial, scale, shape)?;
            Ok(Box::new(DeterministicKernel::new(
                distribution,
                config.dispersal_percentage,
                config.ns_res,
                config.ew_res,
                Rc::clone(dispersers),
            )))
        }
        radial => Ok(Box::new(RadialKernel::new(
            radial,
            scale,
            shape,
            direction,
            kappa,
            config.ns_res,
            config.ew_res,
        )?)),
    }
}

fn radial_distribution(kernel_type: DispersalKernelType, scale: f64, shape: f64) -> Result<RadialDistribution> {
    Ok(match kernel_type {
        DispersalKernelType::Cauchy => RadialDistribution::Cauchy { s: scale },
        DispersalKernelType::Exponential => RadialDistribution::Exponential { scale },
        DispersalKernelType::Weibull => RadialDistribution::Weibull { shape, scale },
        DispersalKernelType::LogNormal => RadialDistribution::LogNormal { mu: scale, sigma: shape },
        DispersalKernelType::Normal => RadialDistribution::Normal { mu: scale, sigma: shape },
        DispersalKernelType::PowerLaw => RadialDistribution::PowerLaw { xmin: scale, alpha: shape },
        DispersalKernelType::HyperbolicSecant => RadialDistribution::HyperbolicSecant { s: scale },
        DispersalKernelType::Logistic => RadialDistribution::Logistic { location: scale, scale: shape },
        DispersalKernelType::Gamma => RadialDistribution::Gamma { shape, scale },
        DispersalKernelType::ExponentialPower => RadialDistribution::ExponentialPower { alpha: scale, beta: shape },
        other => {
            return Err(PopsError::UnsupportedKernel { kernel: "DeterministicKernel", requested: other });
        }
    })
}

/// Build the natural/anthropogenic selector the spread action drives.
pub fn build_spread_kernel(
    config: &Config,
    dispersers: &Rc<RefCell<Raster<i32>>>,
    network: Option<&Rc<Network>>,
) -> Result<Box<dyn Kernel>> {
    let natural = build_named_kernel(
        config.natural_kernel_type,
        config.natural_scale,
        config.shape,
        config.natural_direction,
        config.natural_kappa,
        config,
        dispersers,
        network,
    )?;
    if !config.use_anthropogenic_kernel {
        return Ok(natural);
    }
    let anthropogenic = build_named_kernel(
        config.anthro_kernel_type,
        config.anthro_scale,
        config.shape,
        config.anthro_direction,
        config.anthro_kappa,
        config,
        dispersers,
        network,
    )?;
    Ok(Box::new(NaturalAnthropogenicKernel::new(
        natural,
        Some(anthropogenic),
        config.percent_natural_dispersal,
    )))
}

/// Build the overpopulation-movement kernel: same family as natural, with
/// scale multiplied by `leaving_scale_coefficient`.
pub fn build_overpopulation_kernel(
    config: &Config,
    dispersers: &Rc<RefCell<Raster<i32>>>,
    network: Option<&Rc<Network>>,
) -> Result<Box<dyn Kernel>> {
    build_named_kernel(
        config.natural_kernel_type,
        config.natural_scale * config.leaving_scale_coefficient,
        config.shape,
        config.natural_direction,
        config.natural_kappa,
        config,
        dispersers,
        network,
    )
}
