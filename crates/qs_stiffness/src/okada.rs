// crates/qs_stiffness/src/okada.rs

//! 弹性半空间有限矩形位错解 (Okada 1992, DC3D)
//!
//! 给定埋藏矩形位错源的几何（深度、倾角、沿走向/沿倾向范围）与位错量
//! （走滑、倾滑、张裂），计算观测点处的位移及其 3x3 空间导数。
//!
//! 解由"实源"项与"像源"项叠加，以满足自由表面边界条件。观测点恰好位于
//! 断层边缘或其负向延长线上时解奇异，返回 `None`；调用方应当作"未知"
//! 处理而不是零。
//!
//! 近边缘的量按 1e-6 容差截断为 0，倾角余弦小于同一容差时截断为精确 0
//! （保留正弦符号），分支结构与原始算法逐项一致。
//!
//! 坐标约定：x 沿走向，y 垂直走向指向上盘一侧的水平方向，z 向上，
//! 观测点 `z <= 0`。

/// 2π
const PI2: f64 = 6.283_185_307_179_586;

/// 近零截断容差
const EPS: f64 = 1.0e-6;

/// 矩形位错源几何
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DislocationSource {
    /// 参考点深度（正值）
    pub depth: f64,
    /// 倾角 (度)
    pub dip: f64,
    /// 沿走向范围起点
    pub al1: f64,
    /// 沿走向范围终点
    pub al2: f64,
    /// 沿倾向范围起点
    pub aw1: f64,
    /// 沿倾向范围终点
    pub aw2: f64,
}

/// 位错量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dislocation {
    /// 走滑分量
    pub strike_slip: f64,
    /// 倾滑分量
    pub dip_slip: f64,
    /// 张裂分量
    pub tensile: f64,
}

/// 位移与位移梯度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    /// 位移 (ux, uy, uz)
    pub u: [f64; 3],
    /// 位移梯度，`du[i][j] = ∂u_i/∂x_j`
    pub du: [[f64; 3]; 3],
}

impl Displacement {
    fn from_packed(u: &[f64; 12]) -> Self {
        Self {
            u: [u[0], u[1], u[2]],
            du: [[u[3], u[6], u[9]], [u[4], u[7], u[10]], [u[5], u[8], u[11]]],
        }
    }
}

/// 与倾角、介质相关的常数 (DCCON0)
struct DipConstants {
    alp1: f64,
    alp2: f64,
    alp3: f64,
    alp4: f64,
    alp5: f64,
    sd: f64,
    cd: f64,
    sdsd: f64,
    cdcd: f64,
    sdcd: f64,
}

impl DipConstants {
    fn new(alpha: f64, dip: f64) -> Self {
        let p18 = PI2 / 360.0;
        let mut sd = (dip * p18).sin();
        let mut cd = (dip * p18).cos();
        if cd.abs() < EPS {
            cd = 0.0;
            if sd > 0.0 {
                sd = 1.0;
            }
            if sd < 0.0 {
                sd = -1.0;
            }
        }
        Self {
            alp1: (1.0 - alpha) / 2.0,
            alp2: alpha / 2.0,
            alp3: (1.0 - alpha) / alpha,
            alp4: 1.0 - alpha,
            alp5: alpha,
            sd,
            cd,
            sdsd: sd * sd,
            cdcd: cd * cd,
            sdcd: sd * cd,
        }
    }
}

/// 与观测点相对源角点位置相关的几何因子 (DCCON2)
#[derive(Default)]
struct CornerTerms {
    xi2: f64,
    et2: f64,
    q2: f64,
    r: f64,
    r2: f64,
    r3: f64,
    r5: f64,
    y: f64,
    d: f64,
    tt: f64,
    alx: f64,
    ale: f64,
    x11: f64,
    y11: f64,
    x32: f64,
    y32: f64,
    ey: f64,
    ez: f64,
    fy: f64,
    fz: f64,
    gy: f64,
    gz: f64,
    hy: f64,
    hz: f64,
}

impl CornerTerms {
    #[allow(clippy::many_single_char_names)]
    fn new(xi: f64, et: f64, q: f64, sd: f64, cd: f64, kxi: bool, ket: bool) -> Self {
        let xi = if xi.abs() < EPS { 0.0 } else { xi };
        let et = if et.abs() < EPS { 0.0 } else { et };
        let q = if q.abs() < EPS { 0.0 } else { q };

        let mut c = Self {
            xi2: xi * xi,
            et2: et * et,
            q2: q * q,
            ..Self::default()
        };
        c.r2 = c.xi2 + c.et2 + c.q2;
        c.r = c.r2.sqrt();
        if c.r == 0.0 {
            return c;
        }
        c.r3 = c.r * c.r2;
        c.r5 = c.r3 * c.r2;
        c.y = et * cd + q * sd;
        c.d = et * sd - q * cd;

        c.tt = if q == 0.0 {
            0.0
        } else {
            (xi * et / (q * c.r)).atan()
        };

        if kxi {
            c.alx = -(c.r - xi).ln();
            c.x11 = 0.0;
            c.x32 = 0.0;
        } else {
            let rxi = c.r + xi;
            c.alx = rxi.ln();
            c.x11 = 1.0 / (c.r * rxi);
            c.x32 = (c.r + rxi) * c.x11 * c.x11 / c.r;
        }

        if ket {
            c.ale = -(c.r - et).ln();
            c.y11 = 0.0;
            c.y32 = 0.0;
        } else {
            let ret = c.r + et;
            c.ale = ret.ln();
            c.y11 = 1.0 / (c.r * ret);
            c.y32 = (c.r + ret) * c.y11 * c.y11 / c.r;
        }

        c.ey = sd / c.r - c.y * q / c.r3;
        c.ez = cd / c.r + c.d * q / c.r3;
        c.fy = c.d / c.r3 + c.xi2 * c.y32 * sd;
        c.fz = c.y / c.r3 + c.xi2 * c.y32 * cd;
        c.gy = 2.0 * c.x11 * sd - c.y * q * c.x32;
        c.gz = 2.0 * c.x11 * cd + c.d * q * c.x32;
        c.hy = c.d * q * c.x32 + xi * q * c.y32 * sd;
        c.hz = c.y * q * c.x32 + xi * q * c.y32 * cd;
        c
    }
}

/// 累加 `scale * du` 到 `u`
#[inline]
fn accumulate(u: &mut [f64; 12], disl: f64, du: &[f64; 12]) {
    let scale = disl / PI2;
    for (ui, dui) in u.iter_mut().zip(du) {
        *ui += scale * dui;
    }
}

/// 全空间项 (UA)
fn ua(xi: f64, et: f64, q: f64, disl: &Dislocation, c0: &DipConstants, c2: &CornerTerms) -> [f64; 12] {
    let mut u = [0.0; 12];
    let xy = xi * c2.y11;
    let qx = q * c2.x11;
    let qy = q * c2.y11;
    let (sd, cd) = (c0.sd, c0.cd);

    if disl.strike_slip != 0.0 {
        let du = [
            c2.tt / 2.0 + c0.alp2 * xi * qy,
            c0.alp2 * q / c2.r,
            c0.alp1 * c2.ale - c0.alp2 * q * qy,
            -c0.alp1 * qy - c0.alp2 * c2.xi2 * q * c2.y32,
            -c0.alp2 * xi * q / c2.r3,
            c0.alp1 * xy + c0.alp2 * xi * c2.q2 * c2.y32,
            c0.alp1 * xy * sd + c0.alp2 * xi * c2.fy + c2.d / 2.0 * c2.x11,
            c0.alp2 * c2.ey,
            c0.alp1 * (cd / c2.r + qy * sd) - c0.alp2 * q * c2.fy,
            c0.alp1 * xy * cd + c0.alp2 * xi * c2.fz + c2.y / 2.0 * c2.x11,
            c0.alp2 * c2.ez,
            -c0.alp1 * (sd / c2.r - qy * cd) - c0.alp2 * q * c2.fz,
        ];
        accumulate(&mut u, disl.strike_slip, &du);
    }
    if disl.dip_slip != 0.0 {
        let du = [
            c0.alp2 * q / c2.r,
            c2.tt / 2.0 + c0.alp2 * et * qx,
            c0.alp1 * c2.alx - c0.alp2 * q * qx,
            -c0.alp2 * xi * q / c2.r3,
            -qy / 2.0 - c0.alp2 * et * q / c2.r3,
            c0.alp1 / c2.r + c0.alp2 * c2.q2 / c2.r3,
            c0.alp2 * c2.ey,
            c0.alp1 * c2.d * c2.x11 + xy / 2.0 * sd + c0.alp2 * et * c2.gy,
            c0.alp1 * c2.y * c2.x11 - c0.alp2 * q * c2.gy,
            c0.alp2 * c2.ez,
            c0.alp1 * c2.y * c2.x11 + xy / 2.0 * cd + c0.alp2 * et * c2.gz,
            -c0.alp1 * c2.d * c2.x11 - c0.alp2 * q * c2.gz,
        ];
        accumulate(&mut u, disl.dip_slip, &du);
    }
    if disl.tensile != 0.0 {
        let du = [
            -c0.alp1 * c2.ale - c0.alp2 * q * qy,
            -c0.alp1 * c2.alx - c0.alp2 * q * qx,
            c2.tt / 2.0 - c0.alp2 * (et * qx + xi * qy),
            -c0.alp1 * xy + c0.alp2 * xi * c2.q2 * c2.y32,
            -c0.alp1 / c2.r + c0.alp2 * c2.q2 / c2.r3,
            -c0.alp1 * qy - c0.alp2 * q * c2.q2 * c2.y32,
            -c0.alp1 * (cd / c2.r + qy * sd) - c0.alp2 * q * c2.fy,
            -c0.alp1 * c2.y * c2.x11 - c0.alp2 * q * c2.gy,
            c0.alp1 * (c2.d * c2.x11 + xy * sd) + c0.alp2 * q * c2.hy,
            c0.alp1 * (sd / c2.r - qy * cd) - c0.alp2 * q * c2.fz,
            c0.alp1 * c2.d * c2.x11 - c0.alp2 * q * c2.gz,
            c0.alp1 * (c2.y * c2.x11 + xy * cd) + c0.alp2 * q * c2.hz,
        ];
        accumulate(&mut u, disl.tensile, &du);
    }
    u
}

/// 半空间像源项 (UB)
fn ub(xi: f64, et: f64, q: f64, disl: &Dislocation, c0: &DipConstants, c2: &CornerTerms) -> [f64; 12] {
    let mut u = [0.0; 12];
    let (sd, cd) = (c0.sd, c0.cd);

    let rd = c2.r + c2.d;
    let d11 = 1.0 / (c2.r * rd);
    let aj2 = xi * c2.y / rd * d11;
    let aj5 = -(c2.d + c2.y * c2.y / rd) * d11;

    let (ai3, ai4, ak1, ak3, aj3, aj6);
    if cd != 0.0 {
        ai4 = if xi == 0.0 {
            0.0
        } else {
            let x = (c2.xi2 + c2.q2).sqrt();
            1.0 / c0.cdcd
                * (xi / rd * c0.sdcd
                    + 2.0 * ((et * (x + q * cd) + x * (c2.r + x) * sd) / (xi * (c2.r + x) * cd)).atan())
        };
        ai3 = (c2.y * cd / rd - c2.ale + sd * rd.ln()) / c0.cdcd;
        ak1 = xi * (d11 - c2.y11 * sd) / cd;
        ak3 = (q * c2.y11 - c2.y * d11) / cd;
        aj3 = (ak1 - aj2 * sd) / cd;
        aj6 = (ak3 - aj5 * sd) / cd;
    } else {
        let rd2 = rd * rd;
        ai3 = (et / rd + c2.y * q / rd2 - c2.ale) / 2.0;
        ai4 = xi * c2.y / rd2 / 2.0;
        ak1 = xi * q / rd * d11;
        ak3 = sd / rd * (c2.xi2 * d11 - 1.0);
        aj3 = -xi / rd2 * (c2.q2 * d11 - 0.5);
        aj6 = -c2.y / rd2 * (c2.xi2 * d11 - 0.5);
    }

    let xy = xi * c2.y11;
    let ai1 = -xi / rd * cd - ai4 * sd;
    let ai2 = rd.ln() + ai3 * sd;
    let ak2 = 1.0 / c2.r + ak3 * sd;
    let ak4 = xy * cd - ak1 * sd;
    let aj1 = aj5 * cd - aj6 * sd;
    let aj4 = -xy - aj2 * cd + aj3 * sd;

    let qx = q * c2.x11;
    let qy = q * c2.y11;
    let a = c0.alp3;

    if disl.strike_slip != 0.0 {
        let du = [
            -xi * qy - c2.tt - a * ai1 * sd,
            -q / c2.r + a * c2.y / rd * sd,
            q * qy - a * ai2 * sd,
            c2.xi2 * q * c2.y32 - a * aj1 * sd,
            xi * q / c2.r3 - a * aj2 * sd,
            -xi * c2.q2 * c2.y32 - a * aj3 * sd,
            -xi * c2.fy - c2.d * c2.x11 + a * (xy + aj4) * sd,
            -c2.ey + a * (1.0 / c2.r + aj5) * sd,
            q * c2.fy - a * (qy - aj6) * sd,
            -xi * c2.fz - c2.y * c2.x11 + a * ak1 * sd,
            -c2.ez + a * c2.y * d11 * sd,
            q * c2.fz + a * ak2 * sd,
        ];
        accumulate(&mut u, disl.strike_slip, &du);
    }
    if disl.dip_slip != 0.0 {
        let s = c0.sdcd;
        let du = [
            -q / c2.r + a * ai3 * s,
            -et * qx - c2.tt - a * xi / rd * s,
            q * qx + a * ai4 * s,
            xi * q / c2.r3 + a * aj4 * s,
            et * q / c2.r3 + qy + a * aj5 * s,
            -c2.q2 / c2.r3 + a * aj6 * s,
            -c2.ey + a * aj1 * s,
            -et * c2.gy - xy * sd + a * aj2 * s,
            q * c2.gy + a * aj3 * s,
            -c2.ez - a * ak3 * s,
            -et * c2.gz - xy * cd - a * xi * d11 * s,
            q * c2.gz - a * ak4 * s,
        ];
        accumulate(&mut u, disl.dip_slip, &du);
    }
    if disl.tensile != 0.0 {
        let s = c0.sdsd;
        let du = [
            q * qy - a * ai3 * s,
            q * qx + a * xi / rd * s,
            et * qx + xi * qy - c2.tt - a * ai4 * s,
            -xi * c2.q2 * c2.y32 - a * aj4 * s,
            -c2.q2 / c2.r3 - a * aj5 * s,
            q * c2.q2 * c2.y32 - a * aj6 * s,
            q * c2.fy - a * aj1 * s,
            q * c2.gy - a * aj2 * s,
            -q * c2.hy - a * aj3 * s,
            q * c2.fz + a * ak3 * s,
            q * c2.gz + a * xi * d11 * s,
            -q * c2.hz + a * ak4 * s,
        ];
        accumulate(&mut u, disl.tensile, &du);
    }
    u
}

/// 深度相关项 (UC)
#[allow(clippy::too_many_lines)]
fn uc(
    xi: f64,
    et: f64,
    q: f64,
    z: f64,
    disl: &Dislocation,
    c0: &DipConstants,
    c2: &CornerTerms,
) -> [f64; 12] {
    let mut u = [0.0; 12];
    let (sd, cd) = (c0.sd, c0.cd);
    let (a4, a5) = (c0.alp4, c0.alp5);
    let CornerTerms {
        xi2,
        et2,
        q2,
        r,
        r2,
        r3,
        r5,
        y,
        d,
        x11,
        y11,
        x32,
        y32,
        ..
    } = *c2;

    let c = d + z;
    let x53 = (8.0 * r2 + 9.0 * r * xi + 3.0 * xi2) * x11 * x11 * x11 / r2;
    let y53 = (8.0 * r2 + 9.0 * r * et + 3.0 * et2) * y11 * y11 * y11 / r2;
    let h = q * cd - z;
    let z32 = sd / r3 - h * y32;
    let z53 = 3.0 * sd / r5 - h * y53;
    let y0 = y11 - xi2 * y32;
    let z0 = z32 - xi2 * z53;
    let ppy = cd / r3 + q * y32 * sd;
    let ppz = sd / r3 - q * y32 * cd;
    let qq = z * y32 + z32 + z0;
    let qqy = 3.0 * c * d / r5 - qq * sd;
    let qqz = 3.0 * c * y / r5 - qq * cd + q * y32;
    let xy = xi * y11;
    let qy = q * y11;
    let qr = 3.0 * q / r5;
    let cdr = (c + d) / r3;
    let yy0 = y / r3 - y0 * cd;

    if disl.strike_slip != 0.0 {
        let du = [
            a4 * xy * cd - a5 * xi * q * z32,
            a4 * (cd / r + 2.0 * qy * sd) - a5 * c * q / r3,
            a4 * qy * cd - a5 * (c * et / r3 - z * y11 + xi2 * z32),
            a4 * y0 * cd - a5 * q * z0,
            -a4 * xi * (cd / r3 + 2.0 * q * y32 * sd) + a5 * c * xi * qr,
            -a4 * xi * q * y32 * cd + a5 * xi * (3.0 * c * et / r5 - qq),
            -a4 * xi * ppy * cd - a5 * xi * qqy,
            a4 * 2.0 * (d / r3 - y0 * sd) * sd - y / r3 * cd - a5 * (cdr * sd - et / r3 - c * y * qr),
            -a4 * q / r3 + yy0 * sd + a5 * (cdr * cd + c * d * qr - (y0 * cd + q * z0) * sd),
            a4 * xi * ppz * cd - a5 * xi * qqz,
            a4 * 2.0 * (y / r3 - y0 * cd) * sd + d / r3 * cd - a5 * (cdr * cd + c * d * qr),
            yy0 * cd - a5 * (cdr * sd - c * y * qr - y0 * c0.sdsd + q * z0 * cd),
        ];
        accumulate(&mut u, disl.strike_slip, &du);
    }
    if disl.dip_slip != 0.0 {
        let du = [
            a4 * cd / r - qy * sd - a5 * c * q / r3,
            a4 * y * x11 - a5 * c * et * q * x32,
            -d * x11 - xy * sd - a5 * c * (x11 - q2 * x32),
            -a4 * xi / r3 * cd + a5 * c * xi * qr + xi * q * y32 * sd,
            -a4 * y / r3 + a5 * c * et * qr,
            d / r3 - y0 * sd + a5 * c / r3 * (1.0 - 3.0 * q2 / r2),
            -a4 * et / r3 + y0 * c0.sdsd - a5 * (cdr * sd - c * y * qr),
            a4 * (x11 - y * y * x32) - a5 * c * ((d + 2.0 * q * cd) * x32 - y * et * q * x53),
            xi * ppy * sd + y * d * x32 + a5 * c * ((y + 2.0 * q * sd) * x32 - y * q2 * x53),
            -q / r3 + y0 * c0.sdcd - a5 * (cdr * cd + c * d * qr),
            a4 * y * d * x32 - a5 * c * ((y - 2.0 * q * sd) * x32 + d * et * q * x53),
            -xi * ppz * sd + x11 - d * d * x32 - a5 * c * ((d - 2.0 * q * cd) * x32 - d * q2 * x53),
        ];
        accumulate(&mut u, disl.dip_slip, &du);
    }
    if disl.tensile != 0.0 {
        let du = [
            -a4 * (sd / r + qy * cd) - a5 * (z * y11 - q2 * z32),
            a4 * 2.0 * xy * sd + d * x11 - a5 * c * (x11 - q2 * x32),
            a4 * (y * x11 + xy * cd) + a5 * q * (c * et * x32 + xi * z32),
            a4 * xi / r3 * sd + xi * q * y32 * cd + a5 * xi * (3.0 * c * et / r5 - 2.0 * z32 - z0),
            a4 * 2.0 * y0 * sd - d / r3 + a5 * c / r3 * (1.0 - 3.0 * q2 / r2),
            -a4 * yy0 - a5 * (c * et * qr - q * z0),
            a4 * (q / r3 + y0 * c0.sdcd) + a5 * (z / r3 * cd + c * d * qr - q * z0 * sd),
            -a4 * 2.0 * xi * ppy * sd - y * d * x32 + a5 * c * ((y + 2.0 * q * sd) * x32 - y * q2 * x53),
            -a4 * (xi * ppy * cd - x11 + y * y * x32)
                + a5 * (c * ((d + 2.0 * q * cd) * x32 - y * et * q * x53) + xi * qqy),
            -et / r3 + y0 * c0.cdcd - a5 * (z / r3 * sd - c * y * qr - y0 * c0.sdsd + q * z0 * cd),
            a4 * 2.0 * xi * ppz * sd - x11 + d * d * x32 - a5 * c * ((d - 2.0 * q * cd) * x32 - d * q2 * x53),
            a4 * (xi * ppz * cd + y * d * x32)
                + a5 * (c * ((y - 2.0 * q * sd) * x32 + d * et * q * x53) + xi * qqz),
        ];
        accumulate(&mut u, disl.tensile, &du);
    }
    u
}

/// 观测点位于断层边缘或其负向延长线上
fn is_singular(q: f64, xi: &[f64; 2], et: &[f64; 2]) -> bool {
    q == 0.0
        && ((xi[0] * xi[1] < 0.0 && et[0] * et[1] == 0.0)
            || (et[0] * et[1] < 0.0 && xi[0] * xi[1] == 0.0))
}

/// 计算有限矩形位错在观测点 `(x, y, z)` 处的位移与位移梯度 (DC3D)
///
/// `alpha = (λ + μ) / (λ + 2μ)`。奇异时返回 `None`。
#[must_use]
pub fn dc3d(alpha: f64, x: f64, y: f64, z: f64, source: &DislocationSource, disl: &Dislocation) -> Option<Displacement> {
    let c0 = DipConstants::new(alpha, source.dip);
    let (sd, cd) = (c0.sd, c0.cd);

    let mut xi = [x - source.al1, x - source.al2];
    for v in &mut xi {
        if v.abs() < EPS {
            *v = 0.0;
        }
    }

    let mut u = [0.0_f64; 12];
    let mut du = [0.0_f64; 12];

    for image in [false, true] {
        let d = if image { source.depth - z } else { source.depth + z };
        let p = y * cd + d * sd;
        let mut q = y * sd - d * cd;
        let mut et = [p - source.aw1, p - source.aw2];
        if q.abs() < EPS {
            q = 0.0;
        }
        for v in &mut et {
            if v.abs() < EPS {
                *v = 0.0;
            }
        }

        if is_singular(q, &xi, &et) {
            return None;
        }

        // 对数奇异点附近改用 -ln(R - ξ) / -ln(R - η)
        let r12 = (xi[0] * xi[0] + et[1] * et[1] + q * q).sqrt();
        let r21 = (xi[1] * xi[1] + et[0] * et[0] + q * q).sqrt();
        let r22 = (xi[1] * xi[1] + et[1] * et[1] + q * q).sqrt();
        let kxi = [
            xi[0] < 0.0 && r21 + xi[1] < EPS,
            xi[0] < 0.0 && r22 + xi[1] < EPS,
        ];
        let ket = [
            et[0] < 0.0 && r12 + et[1] < EPS,
            et[0] < 0.0 && r22 + et[1] < EPS,
        ];

        for k in 0..2 {
            for j in 0..2 {
                let c2 = CornerTerms::new(xi[j], et[k], q, sd, cd, kxi[k], ket[j]);
                let a = ua(xi[j], et[k], q, disl, &c0, &c2);

                if image {
                    let b = ub(xi[j], et[k], q, disl, &c0, &c2);
                    let cc = uc(xi[j], et[k], q, z, disl, &c0, &c2);
                    for i in (0..12).step_by(3) {
                        du[i] = a[i] + b[i] + z * cc[i];
                        du[i + 1] = (a[i + 1] + b[i + 1] + z * cc[i + 1]) * cd
                            - (a[i + 2] + b[i + 2] + z * cc[i + 2]) * sd;
                        du[i + 2] = (a[i + 1] + b[i + 1] - z * cc[i + 1]) * sd
                            + (a[i + 2] + b[i + 2] - z * cc[i + 2]) * cd;
                        if i == 9 {
                            du[9] += cc[0];
                            du[10] += cc[1] * cd - cc[2] * sd;
                            du[11] += -cc[1] * sd - cc[2] * cd;
                        }
                    }
                } else {
                    for i in (0..12).step_by(3) {
                        du[i] = -a[i];
                        du[i + 1] = -a[i + 1] * cd + a[i + 2] * sd;
                        du[i + 2] = -a[i + 1] * sd - a[i + 2] * cd;
                        if i == 9 {
                            du[i] = -du[i];
                            du[i + 1] = -du[i + 1];
                            du[i + 2] = -du[i + 2];
                        }
                    }
                }

                if j + k == 1 {
                    for (ui, dui) in u.iter_mut().zip(&du) {
                        *ui -= dui;
                    }
                } else {
                    for (ui, dui) in u.iter_mut().zip(&du) {
                        *ui += dui;
                    }
                }
            }
        }
    }

    Some(Displacement::from_packed(&u))
}
